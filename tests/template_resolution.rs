// tests/template_resolution.rs

use std::collections::BTreeMap;

use gwasdag::exec::template::resolve;

fn bindings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn known_placeholders_are_substituted() {
    let b = bindings(&[("genotypes", "run/a/fileset"), ("maf_min", "0.01")]);
    let resolved = resolve("plink --bfile {genotypes} --maf {maf_min}", &b);
    assert_eq!(resolved, "plink --bfile run/a/fileset --maf 0.01");
}

#[test]
fn repeated_placeholders_are_substituted_everywhere() {
    let b = bindings(&[("out", "x")]);
    let resolved = resolve("cmd --out {out} && mv {out}.tmp {out}", &b);
    assert_eq!(resolved, "cmd --out x && mv x.tmp x");
}

#[test]
fn unknown_placeholders_are_left_untouched() {
    let b = bindings(&[("report", "r.txt")]);
    let resolved = resolve("perl sel.pl {report} {unbound}", &b);
    assert_eq!(resolved, "perl sel.pl r.txt {unbound}");
}

#[test]
fn shell_and_awk_braces_survive() {
    let b = bindings(&[("bim", "data.bim"), ("snps", "xchr.txt")]);
    let resolved = resolve("awk '$1 == 23 {print $2}' {bim} > {snps}", &b);
    assert_eq!(resolved, "awk '$1 == 23 {print $2}' data.bim > xchr.txt");
}

#[test]
fn empty_binding_resolves_to_empty_string() {
    let b = bindings(&[("optional_list", "")]);
    let resolved = resolve("cat /dev/null {optional_list} > drop.txt", &b);
    assert_eq!(resolved, "cat /dev/null  > drop.txt");
}
