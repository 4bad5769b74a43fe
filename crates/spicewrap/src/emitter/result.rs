//! Result assembly
//!
//! Automatic assembly builds one `Py_BuildValue` call whose format is known
//! at generation time. Manual assembly fills a tuple slot by slot so an
//! output whose length is only known after the call can be expanded.

use spicewrap_api::{GeneratorConfig, Marshal, Parameter, ResultStrategy, WrapperPlan};

use super::allocated;

/// Render everything after the failure check
pub fn result_block(plan: &WrapperPlan, config: &GeneratorConfig) -> String {
    if plan.outputs.is_empty() {
        return return_value(plan);
    }

    match &plan.strategy {
        ResultStrategy::Automatic => automatic(plan, config),
        ResultStrategy::Manual { count } => manual(plan, count),
    }
}

/// Format code used when composing an output
fn compose_tag(param: &Parameter) -> String {
    match param.marshal {
        // converters hand back a new reference
        Marshal::Object => "N".to_string(),
        _ => param.format_tag(),
    }
}

fn compose_values(param: &Parameter) -> Vec<String> {
    if param.is_element_array() {
        return param
            .element_refs()
            .iter()
            .map(|element| param.marshal.host_value(element))
            .collect();
    }
    match &param.converters {
        Some(converters) => vec![format!("{}(&{})", converters.to_host, param.name)],
        None => vec![param.marshal.host_value(&param.name)],
    }
}

fn automatic(plan: &WrapperPlan, config: &GeneratorConfig) -> String {
    let found = plan.output(&config.found_flag);

    if found.is_some() && plan.outputs.len() == 1 {
        return format!(
            "\n  if({0}) {{ Py_RETURN_TRUE; }} else {{ Py_RETURN_FALSE; }}",
            config.found_flag
        );
    }

    let mut format = String::new();
    let mut values = Vec::new();
    for param in plan.outputs.iter().filter(|p| p.name != config.found_flag) {
        format.push_str(&compose_tag(param));
        values.extend(compose_values(param));
    }

    let mut out = String::new();
    if found.is_some() {
        out.push_str(&format!(
            "\n  if(!{}) {{\n    Py_RETURN_NONE;\n  }}\n",
            config.found_flag
        ));
    }
    out.push_str(&format!(
        "\n  return Py_BuildValue(\"{}\", {});",
        format,
        values.join(", ")
    ));
    out
}

fn manual(plan: &WrapperPlan, count: &str) -> String {
    let release: String = allocated(plan)
        .map(|p| format!("\n    free({});", p.name))
        .collect();

    let mut out = String::new();
    out.push_str("\n  Py_ssize_t i = 0;");
    out.push_str("\n  PyObject *t = NULL;");
    out.push_str(&format!(
        "\n  PyObject *returnVal = PyTuple_New({});",
        plan.outputs.len()
    ));
    out.push_str(&format!("\n  if(!returnVal) {{{release}\n    return NULL;\n  }}\n"));

    for (slot, param) in plan.outputs.iter().enumerate() {
        if param.allocation_source.is_some() {
            let leaf = param.marshal.code();
            out.push_str(&format!("\n  t = PyTuple_New({count});"));
            out.push_str(&format!("\n  for(i = 0; i < {count}; ++i) {{"));
            out.push_str(&format!(
                "\n    PyTuple_SET_ITEM(t, i, Py_BuildValue(\"{leaf}\", {}));",
                param.marshal.host_value(&format!("{}[i]", param.name))
            ));
            out.push_str("\n  }");
            out.push_str(&format!("\n  PyTuple_SET_ITEM(returnVal, {slot}, t);"));
        } else {
            out.push_str(&format!(
                "\n  PyTuple_SET_ITEM(returnVal, {slot}, Py_BuildValue(\"{}\", {}));",
                compose_tag(param),
                compose_values(param).join(", ")
            ));
        }
    }

    out.push('\n');
    for param in allocated(plan) {
        out.push_str(&format!("\n  free({});", param.name));
    }
    out.push_str("\n  return returnVal;");
    out
}

/// Result for a function without outputs, by its return type
fn return_value(plan: &WrapperPlan) -> String {
    match plan.return_marshal {
        Marshal::Boolean => {
            "\n  if(result) { Py_RETURN_TRUE; } else { Py_RETURN_FALSE; }".to_string()
        }
        // a single character rather than a string
        Marshal::Text if !plan.prototype.return_is_pointer => {
            "\n  return Py_BuildValue(\"C\", (int) result);".to_string()
        }
        Marshal::Text | Marshal::Double | Marshal::Integer => format!(
            "\n  return Py_BuildValue(\"{}\", {});",
            plan.return_marshal.code(),
            plan.return_marshal.host_value("result")
        ),
        Marshal::Object | Marshal::Empty => "\n  Py_RETURN_NONE;".to_string(),
    }
}
