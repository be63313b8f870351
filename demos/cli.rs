use dialoguer::{Confirm, Input};
use pwrules_annotations::{format_rules, parse_password_rules_with_options, ParseOptions};

fn main() -> Result<(), anyhow::Error> {
    // Example rules that you can input:
    //
    // minlength: 8; maxlength: 32; required: lower, upper; required: digit(1, 4); allowed: [-_./\@$*&!#];
    let password_rules = Input::<String>::new()
        .with_prompt("Enter password rules string")
        .interact()?;

    let format_for_minified = Confirm::new()
        .with_prompt("Keep required classes out of allowed?")
        .default(false)
        .interact()?;

    let report =
        parse_password_rules_with_options(&password_rules, &ParseOptions { format_for_minified });

    println!("Parsed rules: {:#?}", report.rules);
    println!("Rendered: {}", format_rules(&report.rules));

    if !report.diagnostics.is_empty() {
        match report.into_result() {
            Ok(_) => println!("The input had warnings but no errors"),
            Err(e) => println!("{}\n", e.to_string_pretty(&password_rules)?),
        }
    }

    Ok(())
}
