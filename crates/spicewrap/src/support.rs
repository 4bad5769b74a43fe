//! Companion header for the generated module
//!
//! The generated unit relies on a handful of macros and converter functions.
//! Rendering the header from the same [`GeneratorConfig`] keeps the buffer
//! lengths and exception name in one place.

use spicewrap_api::GeneratorConfig;

/// Opaque record types and the suffix of their converter pair
const CONVERTED_TYPES: &[(&str, &str)] = &[
    ("SpiceCell", "cell"),
    ("SpiceEllipse", "ellipse"),
    ("SpiceEKAttDsc", "ekattdsc"),
    ("SpiceEKSegSum", "eksegsum"),
    ("SpicePlane", "plane"),
];

/// Render the header named by `config.support_header`
pub fn render_support_header(config: &GeneratorConfig) -> String {
    let guard = include_guard(&config.support_header);
    let exception = &config.exception_name;
    let string_len = &config.string_len_macro;

    let mut out = format!(
        r#"/*
 * Support macros for the generated {module} module.
 *
 * THIS FILE IS GENERATED BY spicewrap, DO NOT EDIT.
 */
#ifndef {guard}
#define {guard} 1

#define PY_SSIZE_T_CLEAN
#include <Python.h>
#include <SpiceUsr.h>

#include <stdio.h>
#include <stdlib.h>

#define {string_len} {len}
#define SPICE_DETAIL_LEN {detail}

/* exception type installed by the module initializer */
extern PyObject *{exception};

#define PYSPICE_CHECK_RETURN_STATUS(status) {{                           \
    if(!status) {{                                                       \
      return NULL;                                                      \
    }}                                                                   \
  }}

#define PYSPICE_CHECK_FAILED {{                                          \
    char spice_detail[SPICE_DETAIL_LEN];                                \
                                                                        \
    if(failed_c()) {{                                                    \
      getmsg_c("long", SPICE_DETAIL_LEN, spice_detail);                 \
      reset_c();                                                        \
      PyErr_SetString({exception}, spice_detail);                       \
      failed = 1;                                                       \
    }}                                                                   \
  }}

/* native -> Python */
"#,
        module = config.module_name,
        len = config.string_len,
        detail = config.detail_len,
    );

    for (native, suffix) in CONVERTED_TYPES {
        out.push_str(&format!("PyObject * get_py_{suffix}({native} *spice_obj);\n"));
    }

    out.push_str("\n/* Python -> native, the result is owned by the caller */\n");
    for (native, suffix) in CONVERTED_TYPES {
        out.push_str(&format!("{native} * get_spice_{suffix}(PyObject *py_obj);\n"));
    }

    out.push_str(&format!("\n#endif /* {guard} */\n"));
    out
}

/// `pyspice.h` → `__PYSPICE_H__`
fn include_guard(header: &str) -> String {
    let name: String = header
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("__{name}__")
}
