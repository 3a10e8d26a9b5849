use pim_master::clean::clean_text;
use pim_master::enrich::ollama::extract_content;
use pim_master::enrich::{build_prompt, gold_enrich, parse_versions, render_template};
use pim_master::model::Table;
use pim_master::{PimError, Result};

#[test]
fn clean_text_collapses_whitespace_then_strips_symbols() {
    assert_eq!(clean_text(None), "");
    assert_eq!(clean_text(Some("  Hello,\t\n world!  ")), "Hello, world!");
    assert_eq!(clean_text(Some("50% off & more?")), "50 off  more?");
    assert_eq!(clean_text(Some("Café")), "Caf");
}

#[test]
fn template_substitutes_known_fields_and_literal_braces() {
    let values = [("desc_a", "one"), ("desc_b", "two")];

    let rendered = render_template("A={desc_a} B={desc_b} {{x}}", &values);

    assert_eq!(rendered.as_deref(), Ok("A=one B=two {x}"));
}

#[test]
fn template_reports_unknown_field() {
    assert_eq!(
        render_template("{desc_a} {item_name}", &[("desc_a", "one")]),
        Err("item_name".to_string())
    );
    assert!(render_template("{desc_a", &[("desc_a", "one")]).is_err());
}

#[test]
fn prompt_with_unknown_field_is_sent_verbatim() {
    assert_eq!(build_prompt("Describe {color}", "a", "b"), "Describe {color}");
    assert_eq!(build_prompt("{desc_a}|{desc_b}", "a", "b"), "a|b");
}

#[test]
fn versions_are_parsed_from_labelled_lines() {
    let text = "Creative: Bold: and bright\nGeneral:plain\nOther: ignored\nProfessional : Formal";

    let [creative, professional, general] = parse_versions(text);

    assert_eq!(creative, "Bold: and bright");
    assert_eq!(professional, "Formal");
    assert_eq!(general, "plain");
    assert_eq!(parse_versions("no labels here"), [String::new(), String::new(), String::new()]);
}

#[test]
fn chat_content_is_extracted_or_body_returned() {
    let body = r#"{"message":{"role":"assistant","content":"  Creative: x \n"}}"#;

    assert_eq!(extract_content(body), "Creative: x");
    assert_eq!(extract_content("not json"), "not json");
    assert_eq!(extract_content(r#"{"error":"busy"}"#), r#"{"error":"busy"}"#);
}

#[test]
fn generator_failure_aborts_enrichment() {
    let table = Table::from_rows(["afi_product_description"], [vec!["a"], vec!["b"]]);
    let failing = |desc_a: &str, _: &str| -> Result<String> {
        if desc_a == "b" {
            Err(PimError::Enrichment("service down".into()))
        } else {
            Ok("General: fine".into())
        }
    };
    let mut progress = 0;

    let result = gold_enrich(
        &table,
        &failing,
        ["afi_product_description", "via_product_description"],
        |done, _| progress = done,
    );

    assert!(matches!(result, Err(PimError::Enrichment(_))));
    assert_eq!(progress, 1);
}
