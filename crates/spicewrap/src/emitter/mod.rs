//! C code emitter
//!
//! Renders one CPython wrapper function from a [`WrapperPlan`]. The body is
//! laid out in a fixed order:
//!
//! 1. output and input declarations
//! 2. argument unmarshaling and host→native conversions
//! 3. dynamic allocations
//! 4. the native call
//! 5. the failure check, which frees allocations and returns `NULL`
//! 6. result assembly (see [`result`])
//!
//! Integer inputs passed by address are unmarshaled into `long` temporaries
//! (`<name>_host`) and narrowed into `SpiceInt` storage before the call, so
//! the native function never sees a `long *`.

mod result;

use serde::{Deserialize, Serialize};
use spicewrap_api::entities::element_refs;
use spicewrap_api::{GeneratorConfig, Marshal, Parameter, WrapperPlan};

pub use result::result_block;

/// One row of the module's method table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Name visible from Python
    pub name: String,
    /// C function implementing the wrapper
    pub entry_point: String,
    /// Symbol of the docstring literal
    pub doc_symbol: String,
}

impl Registration {
    /// Method table row, e.g. `{"utc2et", spice_utc2et, METH_VARARGS, utc2et_doc},`
    pub fn table_row(&self) -> String {
        format!(
            "{{\"{}\", {}, METH_VARARGS, {}}},",
            self.name, self.entry_point, self.doc_symbol
        )
    }
}

/// A rendered wrapper and its method table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedWrapper {
    pub registration: Registration,
    pub body: String,
}

/// Wrap a prototype into a C comment no wider than 80 columns.
///
/// Lines break right after a comma; text without a comma in range is left
/// on one line.
pub fn prototype_comment(text: &str) -> String {
    let mut rest = format!("/* {text} */");
    let mut lines = Vec::new();

    while rest.len() > 80 {
        let Some(comma) = rest.get(..79).and_then(|head| head.rfind(',')) else {
            break;
        };
        let tail = rest.split_off(comma + 1);
        lines.push(std::mem::replace(&mut rest, tail));
    }
    lines.push(rest);

    lines.join("\n")
}

/// Renders wrapper bodies under one configuration
#[derive(Debug, Clone, Copy)]
pub struct WrapperEmitter<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> WrapperEmitter<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn registration(&self, plan: &WrapperPlan) -> Registration {
        let name = self.config.host_name(plan.function_name()).to_string();
        Registration {
            entry_point: format!("{}{}", self.config.wrapper_prefix, name),
            doc_symbol: format!("{name}_doc"),
            name,
        }
    }

    pub fn emit(&self, plan: &WrapperPlan) -> EmittedWrapper {
        let registration = self.registration(plan);
        let mut body = String::new();

        body.push_str(&prototype_comment(&plan.prototype.text));
        body.push_str(&format!(
            "\nstatic PyObject * {}(PyObject *self, PyObject *args)\n{{",
            registration.entry_point
        ));

        self.declarations(plan, &mut body);
        self.unmarshal(plan, &mut body);
        self.allocations(plan, &mut body);
        self.native_call(plan, &mut body);
        self.failure_check(plan, &mut body);
        body.push_str(&result_block(plan, self.config));
        body.push_str("\n}\n");

        EmittedWrapper { registration, body }
    }

    fn declarations(&self, plan: &WrapperPlan, out: &mut String) {
        if !plan.outputs.is_empty() {
            out.push_str("\n  /* variables for outputs */");
        }
        for param in &plan.outputs {
            out.push_str(&format!("\n  {};", self.output_declaration(param)));
        }

        if !plan.inputs.is_empty() {
            out.push_str("\n\n  /* variables for inputs */");
        }
        for param in &plan.inputs {
            if plan.is_implied_length(&param.name) {
                out.push_str(&format!(
                    "\n  {} {} = {};",
                    storage_type(param),
                    param.name,
                    self.config.string_len_macro
                ));
                continue;
            }

            match &param.converters {
                Some(_) if param.marshal == Marshal::Object => {
                    out.push_str(&format!(
                        "\n  {} * {} = NULL;\n  PyObject * py_{} = NULL;",
                        native_type(&param.c_type),
                        param.name,
                        param.name
                    ));
                }
                _ if is_widened(plan, param) => {
                    let dims = dimension_suffix(param);
                    out.push_str(&format!(
                        "\n  {} {}{dims};\n  {} {}{dims};",
                        storage_type(param),
                        host_name(param),
                        native_type(&param.c_type),
                        param.name,
                    ));
                }
                _ => out.push_str(&format!("\n  {};", input_declaration(param))),
            }
        }

        out.push_str("\n\n  char failed = 0;");

        if !plan.prototype.returns_void() {
            let pointer = if plan.prototype.return_is_pointer { " * " } else { " " };
            out.push_str(&format!(
                "\n\n  /* variable for result */\n  {}{}result;",
                plan.prototype.return_type, pointer
            ));
        }
        out.push('\n');
    }

    fn output_declaration(&self, param: &Parameter) -> String {
        if param.allocation_source.is_some() {
            return format!("{} * {} = NULL", param.c_type, param.name);
        }
        if param.is_text_buffer() {
            return format!(
                "{} {}[{}]",
                param.c_type, param.name, self.config.string_len_macro
            );
        }
        format!("{} {}{}", param.c_type, param.name, dimension_suffix(param))
    }

    fn unmarshal(&self, plan: &WrapperPlan, out: &mut String) {
        let mut format = String::new();
        let mut slots = Vec::new();
        let mut conversions = Vec::new();

        for param in plan.retained_inputs() {
            if param.marshal == Marshal::Empty {
                continue;
            }
            format.push_str(&param.format_tag());

            if let Some(converters) = &param.converters {
                slots.push(format!("&py_{}", param.name));
                conversions.push(format!(
                    "{} = {}(py_{});",
                    param.name, converters.to_native, param.name
                ));
            } else if is_widened(plan, param) {
                let host = host_refs(param);
                slots.extend(host.iter().map(|r| format!("&{r}")));
                let native = native_type(&param.c_type);
                conversions.extend(
                    param
                        .element_refs()
                        .into_iter()
                        .zip(host)
                        .map(|(element, host)| format!("{element} = ({native}) {host};")),
                );
            } else {
                slots.extend(param.element_refs().into_iter().map(|r| format!("&{r}")));
            }
        }

        if !slots.is_empty() {
            out.push_str(&format!(
                "\n  PYSPICE_CHECK_RETURN_STATUS(PyArg_ParseTuple(args, \"{}\", {}));",
                format,
                slots.join(", ")
            ));
        }
        for conversion in conversions {
            out.push_str(&format!("\n  {conversion}"));
        }
    }

    fn allocations(&self, plan: &WrapperPlan, out: &mut String) {
        for param in &plan.outputs {
            if let Some(source) = &param.allocation_source {
                out.push_str(&format!(
                    "\n\n  {} = malloc(sizeof({}) * {});",
                    param.name, param.c_type, source
                ));
            }
        }
    }

    fn native_call(&self, plan: &WrapperPlan, out: &mut String) {
        let arguments: Vec<String> = plan
            .inputs
            .iter()
            .map(|p| input_argument(plan, p))
            .chain(plan.outputs.iter().map(output_argument))
            .collect();

        let assign = if plan.prototype.returns_void() { "" } else { "result = " };
        out.push_str(&format!(
            "\n\n  {assign}{}({});",
            plan.function_name(),
            arguments.join(", ")
        ));
    }

    fn failure_check(&self, plan: &WrapperPlan, out: &mut String) {
        out.push_str("\n\n  PYSPICE_CHECK_FAILED;\n");

        // Converted inputs are released on both paths
        for param in plan.inputs.iter().filter(|p| is_converted(p)) {
            out.push_str(&format!("\n  free({});", param.name));
        }

        out.push_str("\n  if(failed) {");
        for param in allocated(plan) {
            out.push_str(&format!("\n    free({});", param.name));
        }
        out.push_str("\n    return NULL;\n  }\n");
    }
}

fn is_converted(param: &Parameter) -> bool {
    param.marshal == Marshal::Object && param.converters.is_some()
}

pub(crate) fn allocated(plan: &WrapperPlan) -> impl Iterator<Item = &Parameter> {
    plan.outputs.iter().filter(|p| p.allocation_source.is_some())
}

fn storage_type(param: &Parameter) -> &str {
    param.marshal.storage().unwrap_or(param.c_type.as_str())
}

fn native_type(c_type: &str) -> &str {
    c_type.strip_prefix("Const").unwrap_or(c_type)
}

/// Integer input whose address reaches the native call
fn is_widened(plan: &WrapperPlan, param: &Parameter) -> bool {
    param.marshal == Marshal::Integer
        && (param.is_pointer || param.is_array())
        && param.converters.is_none()
        && !plan.is_implied_length(&param.name)
}

fn host_name(param: &Parameter) -> String {
    format!("{}_host", param.name)
}

/// Element references of the `long` temporary backing a widened input
fn host_refs(param: &Parameter) -> Vec<String> {
    match param.fixed_dimensions() {
        Some(dims) if param.is_array() => element_refs(&host_name(param), &dims),
        _ => vec![host_name(param)],
    }
}

fn dimension_suffix(param: &Parameter) -> String {
    param
        .dimensions
        .iter()
        .map(|d| match d.fixed() {
            Some(n) => format!("[{n}]"),
            None => "[]".to_string(),
        })
        .collect()
}

fn input_declaration(param: &Parameter) -> String {
    if param.is_text() {
        return format!("{} * {}", storage_type(param), param.name);
    }
    format!(
        "{} {}{}",
        storage_type(param),
        param.name,
        dimension_suffix(param)
    )
}

fn input_argument(plan: &WrapperPlan, param: &Parameter) -> String {
    if plan.is_implied_length(&param.name) || param.is_text() || param.is_array() {
        return param.name.clone();
    }
    if is_converted(param) {
        return if param.is_pointer {
            param.name.clone()
        } else {
            format!("*{}", param.name)
        };
    }
    if param.is_pointer {
        format!("&{}", param.name)
    } else {
        param.name.clone()
    }
}

fn output_argument(param: &Parameter) -> String {
    if param.is_array() || param.is_text() || param.allocation_source.is_some() {
        param.name.clone()
    } else {
        format!("&{}", param.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::parser::parse_prototype;

    fn emit(text: &str) -> EmittedWrapper {
        let config = GeneratorConfig::default();
        let prototype = parse_prototype(text).unwrap();
        let plan = Classifier::new(&config).classify(&prototype).unwrap();
        WrapperEmitter::new(&config).emit(&plan)
    }

    #[test]
    fn test_prototype_comment_short() {
        assert_eq!(
            prototype_comment("SpiceDouble dpr_c ( void );"),
            "/* SpiceDouble dpr_c ( void ); */"
        );
    }

    #[test]
    fn test_prototype_comment_wraps_on_commas() {
        let text = "void et2utc_c ( SpiceDouble et, ConstSpiceChar * format, SpiceInt prec, SpiceInt lenout, SpiceChar * utcstr );";
        let comment = prototype_comment(text);

        assert!(comment.lines().count() > 1);
        for line in comment.lines() {
            assert!(line.len() <= 80, "{line}");
        }
        for line in comment.lines().take(comment.lines().count() - 1) {
            assert!(line.ends_with(','), "{line}");
        }
        assert_eq!(comment.replace('\n', ""), format!("/* {text} */"));
    }

    #[test]
    fn test_prototype_comment_without_commas() {
        let long = format!("void f_c ( SpiceDouble {} );", "x".repeat(90));
        assert_eq!(prototype_comment(&long).lines().count(), 1);
    }

    #[test]
    fn test_registration_names() {
        let wrapper = emit("void utc2et_c ( ConstSpiceChar * utcstr, SpiceDouble * et );");

        assert_eq!(wrapper.registration.name, "utc2et");
        assert_eq!(wrapper.registration.entry_point, "spice_utc2et");
        assert_eq!(wrapper.registration.doc_symbol, "utc2et_doc");
        assert_eq!(
            wrapper.registration.table_row(),
            "{\"utc2et\", spice_utc2et, METH_VARARGS, utc2et_doc},"
        );
    }

    #[test]
    fn test_emit_utc2et() {
        let body = emit("void utc2et_c ( ConstSpiceChar * utcstr, SpiceDouble * et );").body;

        assert!(body.contains("static PyObject * spice_utc2et(PyObject *self, PyObject *args)"));
        assert!(body.contains("  SpiceDouble et;"));
        assert!(body.contains("  char * utcstr;"));
        assert!(body.contains("PyArg_ParseTuple(args, \"s\", &utcstr)"));
        assert!(body.contains("  utc2et_c(utcstr, &et);"));
        assert!(body.contains("PYSPICE_CHECK_FAILED;"));
        assert!(body.contains("return Py_BuildValue(\"d\", et);"));
    }

    #[test]
    fn test_emit_no_parameters() {
        let body = emit("SpiceBoolean failed_c ( void );").body;

        assert!(!body.contains("PyArg_ParseTuple"));
        assert!(body.contains("  SpiceBoolean result;"));
        assert!(body.contains("  result = failed_c();"));
        assert!(body.contains("if(result) { Py_RETURN_TRUE; } else { Py_RETURN_FALSE; }"));
    }

    #[test]
    fn test_emit_matrix_output() {
        let body = emit(
            "void pxform_c ( ConstSpiceChar * from, ConstSpiceChar * to, SpiceDouble et, SpiceDouble rotate[3][3] );",
        )
        .body;

        assert!(body.contains("  SpiceDouble rotate[3][3];"));
        assert!(body.contains("  double et;"));
        assert!(body.contains("PyArg_ParseTuple(args, \"ssd\", &from, &to, &et)"));
        assert!(body.contains("  pxform_c(from, to, et, rotate);"));
        assert!(body.contains("Py_BuildValue(\"((ddd)(ddd)(ddd))\", rotate[0][0], rotate[0][1]"));
        assert!(body.contains("rotate[2][2]);"));
    }

    #[test]
    fn test_emit_input_array_elementwise() {
        let body = emit("SpiceDouble vnorm_c ( ConstSpiceDouble v1[3] );").body;

        assert!(body.contains("  double v1[3];"));
        assert!(body.contains(
            "PyArg_ParseTuple(args, \"(ddd)\", &v1[0], &v1[1], &v1[2])"
        ));
        assert!(body.contains("  result = vnorm_c(v1);"));
        assert!(body.contains("return Py_BuildValue(\"d\", result);"));
    }

    #[test]
    fn test_emit_text_output_implied_length() {
        let body = emit(
            "void et2utc_c ( SpiceDouble et, ConstSpiceChar * format, SpiceInt prec, SpiceInt lenout, SpiceChar * utcstr );",
        )
        .body;

        assert!(body.contains("  SpiceChar utcstr[STRING_LEN];"));
        assert!(body.contains("  long lenout = STRING_LEN;"));
        assert!(body.contains("PyArg_ParseTuple(args, \"dsl\", &et, &format, &prec)"));
        assert!(body.contains("  et2utc_c(et, format, prec, lenout, utcstr);"));
        assert!(body.contains("return Py_BuildValue(\"s\", utcstr);"));
    }

    #[test]
    fn test_emit_found_flag_alone() {
        let body = emit("void f_c ( ConstSpiceChar * name, SpiceBoolean * found );").body;

        assert!(body.contains("if(found) { Py_RETURN_TRUE; } else { Py_RETURN_FALSE; }"));
        assert!(!body.contains("Py_BuildValue"));
    }

    #[test]
    fn test_emit_found_flag_gates_outputs() {
        let body = emit(
            "void bodn2c_c ( ConstSpiceChar * name, SpiceInt * code, SpiceBoolean * found );",
        )
        .body;

        assert!(body.contains("if(!found) {\n    Py_RETURN_NONE;\n  }"));
        assert!(body.contains("return Py_BuildValue(\"l\", (long) code);"));
        assert!(body.contains("  bodn2c_c(name, &code, &found);"));
    }

    #[test]
    fn test_emit_manual_assembly() {
        let body = emit(
            "void bodvrd_c ( ConstSpiceChar * bodynm, ConstSpiceChar * item, SpiceInt maxn, SpiceInt * dim, SpiceDouble * values );",
        )
        .body;

        assert!(body.contains("  SpiceDouble * values = NULL;"));
        assert!(body.contains("  values = malloc(sizeof(SpiceDouble) * maxn);"));
        assert!(body.contains("  bodvrd_c(bodynm, item, maxn, &dim, values);"));
        assert!(body.contains("  if(failed) {\n    free(values);\n    return NULL;\n  }"));
        assert!(body.contains("PyTuple_New(2)"));
        assert!(body.contains("t = PyTuple_New(dim);"));
        assert!(body.contains("PyTuple_SET_ITEM(t, i, Py_BuildValue(\"d\", values[i]));"));
        // freed on the success path as well
        assert_eq!(body.matches("free(values);").count(), 3);
    }

    #[test]
    fn test_emit_object_input_and_output() {
        let body = emit(
            "void inrypl_c ( ConstSpiceDouble vertex[3], ConstSpiceDouble dir[3], ConstSpicePlane * plane, SpiceInt * nxpts, SpiceDouble xpt[3] );",
        )
        .body;

        assert!(body.contains("  SpicePlane * plane = NULL;\n  PyObject * py_plane = NULL;"));
        assert!(body.contains("\"(ddd)(ddd)O\""));
        assert!(body.contains("&py_plane)"));
        assert!(body.contains("  plane = get_spice_plane(py_plane);"));
        assert!(body.contains("inrypl_c(vertex, dir, plane, &nxpts, xpt);"));
        assert!(body.contains("  free(plane);\n  if(failed) {"));
    }

    #[test]
    fn test_emit_object_output_uses_new_reference() {
        let body = emit(
            "void nvc2pl_c ( ConstSpiceDouble normal[3], SpiceDouble constant, SpicePlane * plane );",
        )
        .body;

        assert!(body.contains("  SpicePlane plane;"));
        assert!(body.contains("  nvc2pl_c(normal, constant, &plane);"));
        assert!(body.contains("return Py_BuildValue(\"N\", get_py_plane(&plane));"));
    }

    #[test]
    fn test_emit_void_without_outputs() {
        let body = emit("void reset_c ( void );").body;

        assert!(body.contains("  reset_c();"));
        assert!(body.contains("Py_RETURN_NONE;"));
        assert!(!body.contains("result"));
    }

    #[test]
    fn test_emit_text_return() {
        let body = emit("ConstSpiceChar * tkvrsn_c ( ConstSpiceChar * item );").body;

        assert!(body.contains("  ConstSpiceChar * result;"));
        assert!(body.contains("return Py_BuildValue(\"s\", result);"));
    }

    #[test]
    fn test_emit_integer_array_output_widened() {
        let body = emit("void f_c ( SpiceDouble x, SpiceInt ids[3] );").body;

        assert!(body.contains("  SpiceInt ids[3];"));
        assert!(body.contains(
            "return Py_BuildValue(\"(lll)\", (long) ids[0], (long) ids[1], (long) ids[2]);"
        ));
    }

    #[test]
    fn test_emit_integer_pointer_input_narrowed() {
        let body = emit("void g_c ( SpiceInt * n, SpiceInt m, SpiceDouble * out );").body;

        assert!(body.contains("  long n_host;\n  SpiceInt n;"));
        assert!(body.contains("  long m;"));
        assert!(body.contains("PyArg_ParseTuple(args, \"ll\", &n_host, &m)"));
        assert!(body.contains("  n = (SpiceInt) n_host;"));
        assert!(body.contains("  g_c(&n, m, &out);"));
        assert!(!body.contains("long n;"));
    }

    #[test]
    fn test_emit_integer_array_input_narrowed() {
        let body = emit("void h_c ( ConstSpiceInt v[3], SpiceDouble * out );").body;

        assert!(body.contains("  long v_host[3];\n  SpiceInt v[3];"));
        assert!(body.contains("\"(lll)\", &v_host[0], &v_host[1], &v_host[2])"));
        assert!(body.contains("  v[2] = (SpiceInt) v_host[2];"));
        assert!(body.contains("  h_c(v, &out);"));
        assert!(!body.contains("long v[3];"));
    }

    #[test]
    fn test_emit_reserved_name() {
        let body = emit("void f_c ( SpiceInt free, SpiceDouble * out );").body;

        assert!(body.contains("  long free_;"));
        assert!(body.contains("f_c(free_, &out);"));
        assert!(!body.contains("long free;"));
    }
}
