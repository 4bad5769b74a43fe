//! Integration tests for the wrapper generator

use spicewrap::docs::NoDocs;
use spicewrap::{render_support_header, DocExtractor, Generator, GeneratorConfig};
use std::fs;
use tempfile::TempDir;

/// Excerpt of a preprocessed `SpiceUsr.h`, formatted the way the toolkit
/// formats it
const HEADER: &str = r#"
# 1 "/cspice/include/SpiceUsr.h"
# 1 "/cspice/include/SpiceZdf.h" 1
typedef char SpiceChar;
typedef const char ConstSpiceChar;
typedef double SpiceDouble;
typedef int SpiceBoolean;

   void              bodn2c_c ( ConstSpiceChar      * name,
                                SpiceInt            * code,
                                SpiceBoolean        * found  );

   void              bodvrd_c ( ConstSpiceChar      * bodynm,
                                ConstSpiceChar      * item,
                                SpiceInt              maxn,
                                SpiceInt            * dim,
                                SpiceDouble         * values );

   void              et2utc_c ( SpiceDouble           et,
                                ConstSpiceChar      * format,
                                SpiceInt              prec,
                                SpiceInt              lenout,
                                SpiceChar           * utcstr );

   SpiceBoolean      failed_c ( void );

   void              gfevnt_c ( void    ( * udstep ) ( SpiceDouble       et,
                                                       SpiceDouble     * step ),
                                SpiceDouble           tol );

   void              pxform_c ( ConstSpiceChar      * from,
                                ConstSpiceChar      * to,
                                SpiceDouble           et,
                                SpiceDouble           rotate[3][3] );

   void              spkpos_c ( ConstSpiceChar      * targ,
                                SpiceDouble           et,
                                ConstSpiceChar      * ref,
                                ConstSpiceChar      * abcorr,
                                ConstSpiceChar      * obs,
                                SpiceDouble           ptarg[3],
                                SpiceDouble         * lt        );

   void              utc2et_c ( ConstSpiceChar      * utcstr,
                                SpiceDouble         * et      );

   void              zzdummy_c ( SpiceInt             free,
                                 SpiceDouble        * value );
"#;

fn generate() -> spicewrap::Generation {
    Generator::default().generate_from_text(HEADER, &NoDocs)
}

/// The body of one generated wrapper
fn wrapper<'a>(source: &'a str, name: &str) -> &'a str {
    let header = format!("static PyObject * spice_{name}(PyObject *self, PyObject *args)");
    let start = source
        .find(&header)
        .unwrap_or_else(|| panic!("no wrapper for {name}"));
    let end = source[start..].find("\n}\n").unwrap() + start;
    &source[start..end]
}

/// Format string of the PyArg_ParseTuple call, if any
fn parse_format(body: &str) -> Option<&str> {
    let start = body.find("PyArg_ParseTuple(args, \"")? + "PyArg_ParseTuple(args, \"".len();
    let end = body[start..].find('"')? + start;
    Some(&body[start..end])
}

#[test]
fn test_summary_counts() {
    let generation = generate();

    // gfevnt_c is excluded and does not count as used
    assert_eq!(generation.metrics.total, 9);
    assert_eq!(generation.metrics.accepted, 8);
    assert_eq!(generation.metrics.excluded, 1);
    assert_eq!(generation.metrics.failed, 0);
    assert_eq!(
        generation.metrics.summary(),
        "prototypes used: 8, total: 9"
    );
}

#[test]
fn test_utc2et_scenario() {
    let source = generate().source;
    let body = wrapper(&source, "utc2et");

    assert_eq!(parse_format(body), Some("s"));
    assert!(body.contains("utc2et_c(utcstr, &et);"));
    assert!(body.contains("return Py_BuildValue(\"d\", et);"));
}

#[test]
fn test_failed_scenario() {
    let source = generate().source;
    let body = wrapper(&source, "failed");

    assert_eq!(parse_format(body), None);
    assert!(body.contains("if(result) { Py_RETURN_TRUE; } else { Py_RETURN_FALSE; }"));
}

#[test]
fn test_rotation_matrix_scenario() {
    let source = generate().source;
    let body = wrapper(&source, "pxform");

    assert!(body.contains("Py_BuildValue(\"((ddd)(ddd)(ddd))\""));
    let refs = body.matches("rotate[").count();
    // declaration plus nine elements
    assert_eq!(refs, 10);
}

#[test]
fn test_excluded_function_yields_nothing() {
    let source = generate().source;

    assert!(!source.contains("spice_gfevnt"));
    assert!(!source.contains("\"gfevnt\""));
}

#[test]
fn test_reserved_name_never_collides() {
    let source = generate().source;
    let body = wrapper(&source, "zzdummy");

    assert!(body.contains("long free_;"));
    assert!(body.contains("zzdummy_c(free_, &value);"));
    assert!(!body.contains("long free;"));
}

#[test]
fn test_found_flag_with_other_outputs() {
    let source = generate().source;
    let body = wrapper(&source, "bodn2c");

    assert!(body.contains("if(!found) {\n    Py_RETURN_NONE;\n  }"));
    assert!(body.contains("return Py_BuildValue(\"l\", (long) code);"));
}

#[test]
fn test_manual_result_assembly() {
    let source = generate().source;
    let body = wrapper(&source, "bodvrd");

    assert_eq!(parse_format(body), Some("ssl"));
    assert!(body.contains("values = malloc(sizeof(SpiceDouble) * maxn);"));
    assert!(body.contains("PyTuple_New(2)"));

    // freed on the failure path and after the result is built
    let failure = body.find("if(failed) {").unwrap();
    let first_free = body.find("free(values);").unwrap();
    assert!(first_free > failure);
    assert!(body.trim_end().ends_with("free(values);\n  return returnVal;"));
}

#[test]
fn test_implied_length_not_an_argument() {
    let source = generate().source;
    let body = wrapper(&source, "et2utc");

    // et, format and prec come from the caller; lenout is fixed
    assert_eq!(parse_format(body), Some("dsl"));
    assert!(body.contains("long lenout = STRING_LEN;"));
    assert!(body.contains("SpiceChar utcstr[STRING_LEN];"));
}

#[test]
fn test_argument_count_matches_retained_inputs() {
    let generator = Generator::default();
    let source = generator.generate_from_text(HEADER, &NoDocs).source;

    for plan in generator.analyze(HEADER) {
        let name = generator.config().host_name(plan.function_name());
        let body = wrapper(&source, name);

        let tags: String = plan.retained_inputs().map(|p| p.format_tag()).collect();
        let expected = plan.retained_inputs().count();

        match parse_format(body) {
            Some(format) => {
                assert_eq!(format, tags);
                assert_eq!(top_level_items(format), expected, "{name}");
            }
            None => assert_eq!(expected, 0, "{name}"),
        }
    }
}

/// Number of top-level items in a format string
fn top_level_items(format: &str) -> usize {
    let mut depth = 0;
    let mut items = 0;
    for c in format.chars() {
        match c {
            '(' => {
                if depth == 0 {
                    items += 1;
                }
                depth += 1;
            }
            ')' => depth -= 1,
            _ if depth == 0 => items += 1,
            _ => {}
        }
    }
    items
}

#[test]
fn test_method_table_matches_wrappers() {
    let source = generate().source;

    for name in ["bodn2c", "bodvrd", "et2utc", "failed", "pxform", "spkpos", "utc2et"] {
        assert!(
            source.contains(&format!("{{\"{name}\", spice_{name}, METH_VARARGS, {name}_doc}},")),
            "{name}"
        );
    }
    assert_eq!(source.matches("METH_VARARGS").count(), 8);
}

#[test]
fn test_docstrings_from_source_tree() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("utc2et_c.c"),
        "/*\n-Abstract\n\n   Convert \"UTC\" to ET.\n\n-Disclaimer\n\n   None.\n*/\n",
    )
    .unwrap();

    let config = GeneratorConfig::default();
    let docs = DocExtractor::new(dir.path(), config.doc_sections.clone());
    let source = Generator::new(config).generate_from_text(HEADER, &docs).source;

    assert!(source.contains(
        "PyDoc_STRVAR(utc2et_doc, \"-Abstract\\n\\n   Convert \\\"UTC\\\" to ET.\\n\\n\");"
    ));
    assert!(source.contains("PyDoc_STRVAR(failed_doc, \"\");"));
}

#[test]
fn test_config_exclusion_applies() {
    let config = GeneratorConfig::default().with_excluded("utc2et_c");
    let generation = Generator::new(config).generate_from_text(HEADER, &NoDocs);

    assert_eq!(generation.metrics.accepted, 7);
    assert_eq!(generation.metrics.excluded, 2);
    assert!(!generation.source.contains("spice_utc2et"));
}

#[test]
fn test_support_header_agrees_with_module() {
    let config = GeneratorConfig::default().with_string_len(128);
    let header = render_support_header(&config);
    let source = Generator::new(config).generate_from_text(HEADER, &NoDocs).source;

    assert!(header.contains("#define STRING_LEN 128"));
    assert!(source.contains("#include \"pyspice.h\""));
    assert!(source.contains("PyObject *SpiceException;"));
}

#[test]
fn test_metrics_serialize() {
    let metrics = generate().metrics;
    let json = serde_json::to_value(&metrics).unwrap();

    assert_eq!(json["accepted"], 8);
    assert_eq!(json["unterminated"], false);
}
