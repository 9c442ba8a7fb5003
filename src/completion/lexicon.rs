//! The lexicon: the fixed catalog of language keywords, variables, functions,
//! directives and drives, with their categories and documentation.
//!
//! This is read-only data consumed by the completion operations. Labels are
//! grouped into a closed set of categories; documentation is looked up by
//! exact label within a category.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::CompletionItemKind;

/// Category of a lexicon entry. Serialized into `CompletionItem::data` so the
/// resolve step can find the right documentation table.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Statement,
    BuiltinType,
    Keyword,
    DeclarationModifier,
    TypeModifier,
    BuiltinVariable,
    BuiltinFunction,
    Directive,
    Drive,
}

impl Category {
    /// Human-readable category name shown as the completion detail.
    pub fn detail(self) -> &'static str {
        match self {
            Category::Statement => "Statement",
            Category::BuiltinType => "Built-in type",
            Category::Keyword => "Miscellaneous keywords",
            Category::DeclarationModifier => "Declaration modifier",
            Category::TypeModifier => "Type modifier",
            Category::BuiltinVariable => "Built-in variable",
            Category::BuiltinFunction => "Built-in function",
            Category::Directive => "Directive",
            Category::Drive => "Drive",
        }
    }

    pub fn completion_kind(self) -> CompletionItemKind {
        match self {
            Category::BuiltinFunction => CompletionItemKind::FUNCTION,
            _ => CompletionItemKind::TEXT,
        }
    }
}

/// Every completable label, in catalog order.
pub const CATALOG: &[(&str, Category)] = &[
    ("begin:", Category::Statement),
    ("end:", Category::Statement),
    ("set:", Category::Statement),
    ("include:", Category::Statement),
    ("bool", Category::BuiltinType),
    ("integer", Category::BuiltinType),
    ("real", Category::BuiltinType),
    ("string", Category::BuiltinType),
    ("reference", Category::Keyword),
    ("derivatives", Category::Keyword),
    ("coefficient", Category::Keyword),
    ("modified", Category::Keyword),
    ("tolerance", Category::Keyword),
    ("iterations", Category::Keyword),
    ("newton raphson", Category::Keyword),
    ("crank nicolson", Category::Keyword),
    ("position", Category::Keyword),
    ("orientation", Category::Keyword),
    ("rotation", Category::Keyword),
    ("constraint", Category::Keyword),
    ("proportional", Category::Keyword),
    ("viscoelastic", Category::Keyword),
    ("dynamic", Category::Keyword),
    ("static", Category::Keyword),
    ("hydraulic", Category::Keyword),
    ("direction", Category::Keyword),
    ("compressible", Category::Keyword),
    ("incompressible", Category::Keyword),
    ("fluid", Category::Keyword),
    ("skip initial joint assembly", Category::Keyword),
    ("residual", Category::Keyword),
    ("ifndef", Category::DeclarationModifier),
    ("const", Category::TypeModifier),
    ("Time", Category::BuiltinVariable),
    ("TimeStep", Category::BuiltinVariable),
    ("Step", Category::BuiltinVariable),
    ("Var", Category::BuiltinVariable),
    ("e", Category::BuiltinVariable),
    ("pi", Category::BuiltinVariable),
    ("FALSE", Category::BuiltinVariable),
    ("TRUE", Category::BuiltinVariable),
    ("INT_MAX", Category::BuiltinVariable),
    ("INT_MIN", Category::BuiltinVariable),
    ("RAND_MAX", Category::BuiltinVariable),
    ("REAL_MAX", Category::BuiltinVariable),
    ("REAL_MIN", Category::BuiltinVariable),
    ("in2m", Category::BuiltinVariable),
    ("m2in", Category::BuiltinVariable),
    ("in2mm", Category::BuiltinVariable),
    ("mm2in", Category::BuiltinVariable),
    ("ft2m", Category::BuiltinVariable),
    ("m2ft", Category::BuiltinVariable),
    ("lb2kg", Category::BuiltinVariable),
    ("kg2lb", Category::BuiltinVariable),
    ("deg2rad", Category::BuiltinVariable),
    ("rad2deg", Category::BuiltinVariable),
    ("slug2kg", Category::BuiltinVariable),
    ("abs", Category::BuiltinFunction),
    ("acos", Category::BuiltinFunction),
    ("acosh", Category::BuiltinFunction),
    ("actan", Category::BuiltinFunction),
    ("actan2", Category::BuiltinFunction),
    ("actanh", Category::BuiltinFunction),
    ("asinh", Category::BuiltinFunction),
    ("atanh", Category::BuiltinFunction),
    ("asin", Category::BuiltinFunction),
    ("atan", Category::BuiltinFunction),
    ("atan2", Category::BuiltinFunction),
    ("ceil", Category::BuiltinFunction),
    ("copysign", Category::BuiltinFunction),
    ("cos", Category::BuiltinFunction),
    ("cosh", Category::BuiltinFunction),
    ("ctan", Category::BuiltinFunction),
    ("ctanh", Category::BuiltinFunction),
    ("exp", Category::BuiltinFunction),
    ("floor", Category::BuiltinFunction),
    ("in_ee", Category::BuiltinFunction),
    ("in_el", Category::BuiltinFunction),
    ("in_le", Category::BuiltinFunction),
    ("in_ll", Category::BuiltinFunction),
    ("log", Category::BuiltinFunction),
    ("log10", Category::BuiltinFunction),
    ("max", Category::BuiltinFunction),
    ("min", Category::BuiltinFunction),
    ("par", Category::BuiltinFunction),
    ("print", Category::BuiltinFunction),
    ("ramp", Category::BuiltinFunction),
    ("rand", Category::BuiltinFunction),
    ("random", Category::BuiltinFunction),
    ("round", Category::BuiltinFunction),
    ("seed", Category::BuiltinFunction),
    ("sign", Category::BuiltinFunction),
    ("sin", Category::BuiltinFunction),
    ("sinh", Category::BuiltinFunction),
    ("sprintf", Category::BuiltinFunction),
    ("sqrt", Category::BuiltinFunction),
    ("sramp", Category::BuiltinFunction),
    ("step", Category::BuiltinFunction),
    ("stop", Category::BuiltinFunction),
    ("tan", Category::BuiltinFunction),
    ("tanh", Category::BuiltinFunction),
    ("constitutive law:", Category::Directive),
    ("c81 data:", Category::Directive),
    ("drive caller:", Category::Directive),
    ("hydraulic fluid:", Category::Directive),
    ("include:", Category::Directive),
    ("module load:", Category::Directive),
    ("reference:", Category::Directive),
    ("direct", Category::Drive),
    ("time", Category::Drive),
    ("timestep", Category::Drive),
    ("unit", Category::Drive),
];

/// Documentation for a label, looked up by exact match within a category.
/// Multi-paragraph entries are assembled from their source lines.
pub fn documentation(category: Category, label: &str) -> Option<String> {
    match category {
        Category::Statement => match label {
            "begin:" => Some("Begin block of code".to_string()),
            "end:" => Some("End block of code".to_string()),
            "set:" => Some(
                [
                    "Set variable value for the rest of the text file.",
                    "Example:",
                    "set: type name = value",
                ]
                .join("\n"),
            ),
            "reference:" => Some("Begin reference definition".to_string()),
            "include:" => Some(
                "Include statement. Allows to include the contents of file_name into the current input file."
                    .to_string(),
            ),
            _ => None,
        },
        Category::BuiltinType => Some(
            ["Specify variable type.", "Example:", "set: <type> name = value"].join("\n"),
        ),
        Category::Keyword => match label {
            "reference" => Some("Explicit reference to element".to_string()),
            _ => None,
        },
        Category::DeclarationModifier => Some(
            [
                "The ifndef modifier prevents the declaration from being overwritten if it has already been declared.",
                "Example:",
                "ifndef: type name = value",
            ]
            .join("\n"),
        ),
        Category::TypeModifier => Some(
            [
                "The const modifier prevents the declaration from being overwritten.",
                "Example:",
                "const: type name = value",
            ]
            .join("\n"),
        ),
        Category::BuiltinVariable => builtin_variable_documentation(label).map(str::to_string),
        Category::BuiltinFunction => builtin_function_documentation(label),
        Category::Directive => directive_documentation(label),
        Category::Drive => drive_documentation(label).map(str::to_string),
    }
}

fn builtin_variable_documentation(label: &str) -> Option<&'static str> {
    match label {
        "Time" => Some("Current simulation time"),
        "TimeStep" => Some("Current simulation time step"),
        "Step" => Some("Current simulation step"),
        "Var" => Some(
            "Set by dof, node, or element drive callers with degree of freedom value, node or element private data value, respectively",
        ),
        "e" => Some("Neper’s number"),
        "pi" => Some("Pi constant"),
        "FALSE" => Some("Bool false constant"),
        "TRUE" => Some("Bool true constant"),
        "INT_MAX" => Some("Largest integer"),
        "INT_MIN" => Some("Smallest integer"),
        "RAND_MAX" => Some("Largest random integer"),
        "REAL_MAX" => Some("Largest real"),
        "REAL_MIN" => Some("Smallest real"),
        "in2m" => Some("Inch to meter ratio (0.0254)"),
        "m2in" => Some("Meter to inch ratio (1.0/0.0254)"),
        "in2mm" => Some("Inch to meter ratio (25.4)"),
        "mm2in" => Some("Meter to inch ratio (1.0/25.4)"),
        "ft2m" => Some("Foot to meter ratio (0.3048)"),
        "m2ft" => Some("Meter to foot ratio (1.0/0.3048)"),
        "lb2kg" => Some("Pound to kilogram ratio (0.45359237)"),
        "kg2lb" => Some("Kilogram to pound ratio (1.0/0.45359237)"),
        "deg2rad" => Some("Degree to radian ratio (π/180)"),
        "rad2deg" => Some("Radian to degree ratio (180/π)"),
        "slug2kg" => Some(" Slug to kilogram ratio (14.5939)"),
        "kg2slug" => Some("Kilogram to slug ratio (1.0/14.5939)"),
        _ => None,
    }
}

fn builtin_function_documentation(label: &str) -> Option<String> {
    let documentation = match label {
        "abs" => "absolute value",
        "acos" => "arc cosine",
        "acosh" => "hyperbolic arc cosine",
        "actan" => "arc co-tangent",
        "actan2" => "(robust) arc co-tangent of y/x",
        "actanh" => "hyperbolic arc co-tangent",
        "asinh" => "hyperbolic arc sine",
        "atanh" => "hyperbolic arc tangent",
        "asin" => "arc sine",
        "atan" => "arc tangent",
        "atan2" => "(robust) arc tangent of y/x",
        "ceil" => "closest integer from above",
        "copysign" => "ﬁrst arg with sign of second",
        "cos" => "cosine",
        "cosh" => "hyperbolic cosine",
        "ctan" => "co-tangent",
        "ctanh" => "hyperbolic co-tangent",
        "exp" => "exponential",
        "floor" => "closest integer from below",
        "in_ee" => "true when arg1 ≤ arg2 ≤ arg3, false otherwise",
        "in_el" => "true when arg1 ≤ arg2 < arg3, false otherwise",
        "in_le" => "true when arg1 < arg2 ≤ arg3, false otherwise",
        "in_ll" => "true when arg1 < arg2 < arg3, false otherwise",
        "log" => "natural logarithm",
        "log10" => "base 10 logarithm",
        "max" => "returns the smallest of the two inputs",
        "min" => "returns the largest of the two inputs",
        "par" => "parabolic function",
        "print" => "prints a value to standard output",
        "ramp" => "ramp function",
        "rand" => "random integer [0, RAND MAX]",
        "random" => "random real [-1.0, 1.0]",
        "round" => "closest integer",
        "seed" => "seeds the random number generator",
        "sign" => "sign of a number",
        "sin" => "sine",
        "sinh" => "hyperbolic sine",
        "sprintf" => {
            return Some(
                [
                    "returns a string with value formatted according to format (string, any) -> string",
                    "Examples:",
                    "sprintf(\"%04d\", 9); -> \"0009\"",
                    "sprintf(\"0x%x\", 255); -> Print an integer in hexadecimal format",
                ]
                .join("\n"),
            )
        }
        "sqrt" => "square root",
        "sramp" => "saturated ramp function",
        "step" => "step function",
        "stop" => "stops and returns second arg if first is true (bool, integer) -> integer",
        "tan" => "tangent",
        "tanh" => "hyperbolic tangent",
        _ => return None,
    };
    Some(documentation.to_string())
}

fn directive_documentation(label: &str) -> Option<String> {
    match label {
        "constitutive law:" => Some(
            "Constitutive laws are grouped by their dimensionality dim, which (up to now) can be any of 1, 3 and 6."
                .to_string(),
        ),
        "c81 data:" => Some(
            "This keyword allows to deﬁne and read the c81 dataairfoil tables that are used by aerodynamic elements."
                .to_string(),
        ),
        "drive caller:" => Some(
            [
                "Allows to deﬁne a drive caller that can be subsequently reused. It is useful essentially in two cases:",
                "a) to deﬁne a drive that will be used many times throughout a model;",
                " to deﬁne a drive that needs to be used in a later deﬁned part of a model, in order to make it parametric.",
            ]
            .join("\n"),
        ),
        "hydraulic fluid:" => Some(
            "Allows to deﬁne a hydraulic fluid to be later used in hydraulic elements".to_string(),
        ),
        "include:" => Some(
            [
                "Allows to include the contents of the file file_name, which must be a valid ﬁlename for the operating",
                "system in use. The ﬁle name must be enclosed in double quotes (\"). The full (absolute or relative) path",
                "must be given if the included ﬁle is not in the directory of the including one.",
            ]
            .join("\n"),
        ),
        "print symbol table:" => Some(
            [
                "allows to print to standard output the contents of the parser’s symbol table at any stage of the input",
                "phase. This may be useful for model debugging purposes.",
            ]
            .join("\n"),
        ),
        "reference:" => Some("A reference system is declared and deﬁned.".to_string()),
        _ => None,
    }
}

fn drive_documentation(label: &str) -> Option<&'static str> {
    match label {
        "direct" => Some("Direct drive caller. Transparently returns the input value. The arglist is empty"),
        "time" => Some("Yields the current time. The arglist is empty"),
        "timestep" => Some("Yields the current timestep. The arglist is empty"),
        "unit" => Some("Always 1. The arglist is empty"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_labels_are_unique_within_their_category() {
        for (index, (label, category)) in CATALOG.iter().enumerate() {
            let duplicates = CATALOG[index + 1..]
                .iter()
                .filter(|(other_label, other_category)| {
                    other_label == label && other_category == category
                })
                .count();
            assert_eq!(duplicates, 0, "duplicate catalog entry: {label}");
        }
    }

    #[test]
    fn category_tag_round_trips_through_serde() {
        for &(_, category) in CATALOG {
            let value = serde_json::to_value(category).expect("serialize");
            let parsed: Category = serde_json::from_value(value).expect("deserialize");
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn every_builtin_type_shares_one_documentation_string() {
        let bool_documentation = documentation(Category::BuiltinType, "bool");
        let real_documentation = documentation(Category::BuiltinType, "real");
        assert!(bool_documentation.is_some());
        assert_eq!(bool_documentation, real_documentation);
    }

    #[test]
    fn unknown_labels_have_no_documentation() {
        assert_eq!(documentation(Category::Statement, "nonsense"), None);
        assert_eq!(documentation(Category::Drive, "nonsense"), None);
        assert_eq!(documentation(Category::Keyword, "derivatives"), None);
    }
}
