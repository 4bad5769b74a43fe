use crate::errors::{GenerateError, GenerateResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Functions that never get a wrapper.
///
/// Grouped by the reason they are unsupported: cell appenders, deprecated
/// entry points, character-array searches and sorts, generic-dimension matrix
/// routines, variable input counts, writers taking unsupported subtypes, DAF
/// summary routines, void or 2-D character parameters, helpers that make no
/// sense from Python, and callback-taking routines.
const EXCLUDED: &[&str] = &[
    "cnames",
    // SpiceCell appenders
    "appndc_c",
    "appndd_c",
    "appndi_c",
    "zzsynccl_c",
    // deprecated
    "bodvar_c",
    // const void * / character arrays
    "bschoc_c",
    "bsrchc_c",
    "dafac_c",
    "dafec_c",
    "dasac_c",
    "ekacec_c",
    "ekaclc_c",
    "ekbseg_c",
    "zzgetcml_c",
    "ekifld_c",
    "ekucec_c",
    "esrchc_c",
    "getelm_c",
    "isrchc_c",
    "kxtrct_c",
    "lmpool_c",
    "lstlec_c",
    "lstltc_c",
    "mequg_c",
    "mtxmg_c",
    "mtxvg_c",
    "mxmg_c",
    "mtmtg_c",
    "mxmtg_c",
    "mxvg_c",
    "orderc_c",
    "pcpool_c",
    "swpool_c",
    "vtmvg_c",
    "xposeg_c",
    // SpiceCK05Subtype
    "ckw05_c",
    // variable length inputs
    "maxd_c",
    "maxi_c",
    "mind_c",
    "mini_c",
    // SpiceSPK18Subtype
    "spkw18_c",
    // arrays without an element count
    "dafgs_c",
    "dafps_c",
    "dafus_c",
    "getfov_c",
    "ckw01_c",
    "ckw02_c",
    "ckw03_c",
    "spk14a_c",
    "spkw02_c",
    "spkw03_c",
    "spkw05_c",
    "spkw08_c",
    "spkw09_c",
    "spkw10_c",
    "spkw12_c",
    "spkw13_c",
    // void types in the parameter list
    "dasec_c",
    "ekpsel_c",
    "ekrcec_c",
    "gcpool_c",
    "gnpool_c",
    // no source file
    "dafgh_c",
    "prefix_c",
    // not needed from Python
    "lcase_c",
    "ucase_c",
    "getcml_c",
    "lparse_c",
    "lparsm_c",
    "prompt_c",
    "putcml_c",
    "reordc_c",
    "shellc_c",
    "sumad_c",
    "sumai_c",
    // callbacks
    "gfevnt_c",
    "gffove_c",
    "gfocce_c",
    "gfuds_c",
    "uddc_c",
    "uddf_c",
];

const RETURN_KEYWORDS: &[&str] = &[
    "ConstSpiceChar",
    "SpiceBoolean",
    "SpiceChar",
    "SpiceDouble",
    "SpiceInt",
    "void",
];

const DOC_SECTIONS: &[&str] = &[
    "-Abstract",
    "-Brief_I/O",
    "-Detailed_Input",
    "-Detailed_Output",
];

/// Per-function switch to manual result assembly.
///
/// `output` is allocated with `allocate_from` elements before the native call
/// and returned as a tuple holding `count` elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverride {
    /// Output parameter whose storage is allocated dynamically
    pub output: String,
    /// Input parameter bounding the allocation
    pub allocate_from: String,
    /// Output parameter holding the number of elements actually written
    pub count: String,
}

impl ManualOverride {
    pub fn new(
        output: impl Into<String>,
        allocate_from: impl Into<String>,
        count: impl Into<String>,
    ) -> Self {
        Self {
            output: output.into(),
            allocate_from: allocate_from.into(),
            count: count.into(),
        }
    }
}

/// External command used to macro-expand the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for PreprocessorCommand {
    fn default() -> Self {
        Self {
            program: "gcc".to_string(),
            args: vec!["-E".to_string()],
        }
    }
}

/// Static configuration of a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Leading tokens that start a prototype
    pub return_keywords: Vec<String>,

    /// Functions that never get a wrapper
    pub excluded: BTreeSet<String>,

    /// Parameter names that collide with host identifiers, and their renames
    pub reserved_names: BTreeMap<String, String>,

    /// Functions whose result is assembled manually
    pub manual_overrides: BTreeMap<String, ManualOverride>,

    /// Buffer length handed to the native library for unsized text outputs
    pub string_len: usize,

    /// Macro naming `string_len` in the generated code
    pub string_len_macro: String,

    /// Buffer length for the long error message
    pub detail_len: usize,

    /// Substring marking an input as the length of a text output
    pub length_marker: String,

    /// Name of the boolean output gating other outputs
    pub found_flag: String,

    /// Name of the generated extension module
    pub module_name: String,

    /// Name of the exception type installed in the module
    pub exception_name: String,

    /// Companion header included by the generated unit
    pub support_header: String,

    /// Prefix of every generated entry point
    pub wrapper_prefix: String,

    /// Suffix removed from native names to get the host name
    pub native_suffix: String,

    /// Section headers copied into docstrings
    pub doc_sections: Vec<String>,

    /// Macro preprocessor invocation
    pub preprocessor: PreprocessorCommand,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let manual_overrides = ["bodvcd_c", "bodvrd_c"]
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    ManualOverride::new("values", "maxn", "dim"),
                )
            })
            .collect();

        Self {
            return_keywords: RETURN_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            excluded: EXCLUDED.iter().map(|s| s.to_string()).collect(),
            reserved_names: BTreeMap::from([("free".to_string(), "free_".to_string())]),
            manual_overrides,
            string_len: 255,
            string_len_macro: "STRING_LEN".to_string(),
            detail_len: 1840,
            length_marker: "len".to_string(),
            found_flag: "found".to_string(),
            module_name: "_spice".to_string(),
            exception_name: "SpiceException".to_string(),
            support_header: "pyspice.h".to_string(),
            wrapper_prefix: "spice_".to_string(),
            native_suffix: "_c".to_string(),
            doc_sections: DOC_SECTIONS.iter().map(|s| s.to_string()).collect(),
            preprocessor: PreprocessorCommand::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> GenerateResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GenerateError::Io(path.to_path_buf(), e))?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text; missing fields take defaults
    pub fn from_json(text: &str) -> GenerateResult<Self> {
        serde_json::from_str(text).map_err(|e| GenerateError::Config(e.to_string()))
    }

    pub fn is_excluded(&self, function_name: &str) -> bool {
        self.excluded.contains(function_name)
    }

    pub fn is_return_keyword(&self, token: &str) -> bool {
        self.return_keywords.iter().any(|k| k == token)
    }

    /// Apply the reserved-name table
    pub fn rename(&self, name: &str) -> String {
        self.reserved_names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn manual_override(&self, function_name: &str) -> Option<&ManualOverride> {
        self.manual_overrides.get(function_name)
    }

    /// Host-visible name: the native name without its suffix
    pub fn host_name<'a>(&self, function_name: &'a str) -> &'a str {
        function_name
            .strip_suffix(self.native_suffix.as_str())
            .unwrap_or(function_name)
    }

    pub fn with_excluded(mut self, name: impl Into<String>) -> Self {
        self.excluded.insert(name.into());
        self
    }

    pub fn with_reserved_name(mut self, name: impl Into<String>, rename: impl Into<String>) -> Self {
        self.reserved_names.insert(name.into(), rename.into());
        self
    }

    pub fn with_override(mut self, function: impl Into<String>, rule: ManualOverride) -> Self {
        self.manual_overrides.insert(function.into(), rule);
        self
    }

    pub fn with_string_len(mut self, len: usize) -> Self {
        self.string_len = len;
        self
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }
}
