use assay_core::model::{display_value, AnalyteResult, Report};
use assay_core::reference::Analyte;
use assay_core::validate::{CheckResult, Finding, Verdict};
use assay_core::BatchSummary;
use rust_decimal::Decimal;

pub fn print_report(report: &Report) {
    let profile = report
        .profile
        .map(|p| format!(", profile {p}"))
        .unwrap_or_default();
    println!(
        "=== {} (batch {}, {}{}) ===\n",
        report.sample_id, report.batch_id, report.product_type, profile
    );

    let names: Vec<String> = report.analytes.iter().map(|a| label(&a.name)).collect();
    let max_name = names.iter().map(|n| n.chars().count()).max().unwrap_or(10);
    let per_unit = report.analytes.iter().any(|a| a.mg_per_unit.is_some());

    print!("  {:<width$}  {:>8}  {:>8}  {:<8}", "Analyte", "%", "mg/g", "Result", width = max_name);
    if per_unit {
        print!("  {:>10}", "mg/unit");
    }
    println!();

    for (name, a) in names.iter().zip(&report.analytes) {
        print!(
            "  {:<width$}  {:>8}  {:>8}  {:<8}",
            name,
            quantity(a.result, a.percent),
            quantity(a.result, a.mg_per_g),
            a.result.to_string(),
            width = max_name
        );
        if per_unit {
            print!("  {:>10}", quantity(a.result, a.mg_per_unit));
        }
        println!();
    }
    println!();

    println!("  Total THC            {:>8} %", optional(report.total_thc));
    println!("  Total CBD            {:>8} %", optional(report.total_cbd));
    println!("  Total cannabinoids   {:>8} %", optional(report.total_cannabinoids));
    if let Some(moisture) = report.moisture {
        println!("  Moisture             {:>8} %", display_value(moisture));
    }
    if let (Some(dose), Some(pu)) = (&report.unit_dose, &report.per_unit) {
        println!();
        println!(
            "  Per unit ({} g, {} per package):",
            dose.unit_weight_g, dose.units_per_package
        );
        println!(
            "    THC {} mg/unit, {} mg/package",
            display_value(pu.thc_mg_per_unit),
            display_value(pu.thc_mg_per_package)
        );
        println!(
            "    CBD {} mg/unit, {} mg/package",
            display_value(pu.cbd_mg_per_unit),
            display_value(pu.cbd_mg_per_package)
        );
    }

    let s = &report.status;
    println!();
    println!(
        "  Panels: batch {}, cannabinoids {}, moisture {}, heavy metals {}, pesticides {}, microbials {}",
        s.batch, s.cannabinoids, s.moisture, s.heavy_metals, s.pesticides, s.microbials
    );
}

pub fn print_verdict(verdict: &Verdict, verbose: bool) {
    println!("=== {} ===\n", verdict.sample_id);

    if verdict.passed {
        println!("  Overall: PASS ({} warning(s))\n", verdict.warnings.len());
    } else {
        println!(
            "  Overall: BLOCKED ({} error(s), {} warning(s))\n",
            verdict.errors.len(),
            verdict.warnings.len()
        );
    }

    if !verdict.errors.is_empty() {
        println!("  Errors:");
        for f in &verdict.errors {
            print_finding(f);
        }
        println!();
    }

    if !verdict.warnings.is_empty() {
        println!("  Warnings:");
        for f in &verdict.warnings {
            print_finding(f);
        }
        println!();
    }

    if verbose {
        for check in [&verdict.formula, &verdict.logic, &verdict.uniqueness] {
            print_check(check);
        }
        println!();
        let c = &verdict.computed;
        println!(
            "  Recomputed: total THC {} %, total CBD {} %, total cannabinoids {} %",
            display_value(c.total_thc),
            display_value(c.total_cbd),
            display_value(c.total_cannabinoids)
        );
        let flags = &verdict.flags;
        println!(
            "  Flags: non-detects {}, CBD family {}, Delta-8-THC {}",
            yes_no(flags.has_non_detects),
            yes_no(flags.has_cbd_family),
            yes_no(flags.has_delta8)
        );
        println!();
    }
}

pub fn print_summary(summary: &BatchSummary) {
    println!(
        "Summary: {} passed, {} blocked, {} failed",
        summary.passed, summary.blocked, summary.failed
    );
}

fn print_finding(f: &Finding) {
    println!("    [{}] {}: {}", f.check, f.severity, f.message);
}

fn print_check(check: &CheckResult) {
    let status = if check.passed { "passed" } else { "FAILED" };
    println!(
        "  {:<11} {} ({} finding(s))",
        check.check.to_string(),
        status,
        check.findings.len()
    );
}

/// Display name for a known analyte, raw name otherwise.
fn label(name: &str) -> String {
    Analyte::from_name(name)
        .map(|a| a.to_string())
        .unwrap_or_else(|| name.to_string())
}

fn quantity(result: AnalyteResult, value: Option<Decimal>) -> String {
    match (result, value) {
        (_, None) => "-".into(),
        (AnalyteResult::NotDetected, Some(_)) => "ND".into(),
        (AnalyteResult::BelowQuantitation, Some(_)) => "<LOQ".into(),
        (AnalyteResult::Detected, Some(v)) => display_value(v),
    }
}

fn optional(value: Option<Decimal>) -> String {
    value.map(display_value).unwrap_or_else(|| "-".into())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
