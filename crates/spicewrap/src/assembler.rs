//! Module assembly
//!
//! [`GenerationContext`] collects accepted wrappers and run counters; it is
//! passed by value through the pipeline and only ever appended to.
//! [`render_module`] turns a finished context into the final translation
//! unit.

use spicewrap_api::{GenerationMetrics, GeneratorConfig};

use crate::emitter::{EmittedWrapper, Registration};

/// One accepted function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub registration: Registration,
    /// Complete C string literal
    pub docstring: String,
    pub body: String,
}

/// Accumulated state of one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub entries: Vec<ModuleEntry>,
    pub metrics: GenerationMetrics,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted wrapper
    pub fn accept(mut self, wrapper: EmittedWrapper, docstring: String) -> Self {
        self.entries.push(ModuleEntry {
            registration: wrapper.registration,
            docstring,
            body: wrapper.body,
        });
        self.metrics.total += 1;
        self.metrics.accepted += 1;
        self
    }

    pub fn exclude(mut self) -> Self {
        self.metrics.total += 1;
        self.metrics.excluded += 1;
        self
    }

    pub fn fail(mut self) -> Self {
        self.metrics.total += 1;
        self.metrics.failed += 1;
        self
    }

    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter().map(|e| &e.registration)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registrations().any(|r| r.name == name)
    }

    /// Append another context's entries and counters after this one's
    pub fn merge(mut self, other: GenerationContext) -> Self {
        self.metrics.merge(&other.metrics);
        self.entries.extend(other.entries);
        self
    }
}

const BANNER: &str = "\
/*
THIS IS AUTOMATICALLY GENERATED CODE.  IF THERE IS AN ERROR, PLEASE
MAKE ANY NECESSARY CHANGES IN THE GENERATOR (spicewrap) RATHER THAN
IN THIS FILE.

THIS CODE HAS NOT BEEN THOROUGHLY TESTED, USE AT YOUR OWN RISK.
*/
";

/// Render the complete translation unit
pub fn render_module(context: &GenerationContext, config: &GeneratorConfig) -> String {
    let module = &config.module_name;
    let exception = &config.exception_name;
    let mut out = String::new();

    out.push_str(BANNER);
    out.push_str(&format!("\n#include \"{}\"\n", config.support_header));
    out.push_str(&format!("\nPyObject *{exception};\n"));

    for entry in &context.entries {
        out.push_str(&format!(
            "\nPyDoc_STRVAR({}, {});\n",
            entry.registration.doc_symbol, entry.docstring
        ));
        out.push_str(&entry.body);
    }

    out.push_str("\nstatic PyMethodDef methods[] = {");
    for registration in context.registrations() {
        out.push_str(&format!("\n  {}", registration.table_row()));
    }
    out.push_str("\n  {NULL, NULL, 0, NULL}\n};\n");

    out.push_str(&format!(
        r#"
static struct PyModuleDef spice_module = {{
  PyModuleDef_HEAD_INIT,
  "{module}",
  NULL,
  -1,
  methods
}};

PyMODINIT_FUNC PyInit_{module}(void)
{{
  PyObject *m = NULL;

  m = PyModule_Create(&spice_module);
  if(m == NULL) {{
    return NULL;
  }}

  /* Don't allow an error to stop execution */
  erract_c("SET", 0, "RETURN");
  errdev_c("SET", 0, "NULL");

  {exception} = PyErr_NewException("{module}.{exception}", PyExc_Exception, NULL);
  Py_XINCREF({exception});
  if(PyModule_AddObject(m, "{exception}", {exception}) < 0) {{
    Py_XDECREF({exception});
    Py_CLEAR({exception});
    Py_DECREF(m);
    return NULL;
  }}

  return m;
}}
"#
    ));

    out
}
