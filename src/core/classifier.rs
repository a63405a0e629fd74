use log::warn;

use crate::core::types::{Variable, VariableDecl, DIR_ORDER, KIND_ORDER, TYPE_ORDER};

/// Resolve and classify a declaration-ordered variable list.
///
/// Declarations with an undecodable type or causality annotation are dropped
/// with a logged diagnostic; this is not fatal to the model.
pub fn classify(decls: &[VariableDecl]) -> Vec<Variable> {
    let resolved: Vec<Variable> = decls
        .iter()
        .filter_map(|decl| match Variable::resolve(decl) {
            Some(var) => Some(var),
            None => {
                warn!(
                    "variable '{}' (vref {}) dropped: undecodable type '{}' or causality {:?}",
                    decl.name, decl.vref, decl.variable_type, decl.causality
                );
                None
            }
        })
        .collect();
    sort_by_marshal_group(resolved)
}

/// Stably sort variables into marshal-group order.
///
/// This is a bucket sort: every (kind, type, direction) combination is
/// visited in canonical order and matching variables are appended in their
/// original declaration order. The output ordering is therefore
/// deterministic and independent of declaration order, while variables
/// sharing a classification key keep their relative order.
pub fn sort_by_marshal_group(vars: Vec<Variable>) -> Vec<Variable> {
    let mut sorted = Vec::with_capacity(vars.len());
    for kind in KIND_ORDER {
        for ty in TYPE_ORDER {
            for dir in DIR_ORDER {
                for var in &vars {
                    if var.kind == kind && var.ty == ty && var.dir == dir {
                        sorted.push(var.clone());
                    }
                }
            }
        }
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort_fixture() -> Vec<VariableDecl> {
        // Deliberately shuffled declaration order.
        vec![
            VariableDecl::new("real_1_rx", 20, "Real").with_causality("output"),
            VariableDecl::new("integer_2_rx", 10, "Integer").with_causality("output"),
            VariableDecl::new("string_tx", 40, "String").with_causality("input"),
            VariableDecl::new("Boolean_2_tx", 31, "Boolean").with_causality("input"),
            VariableDecl::new("real_4_local", 23, "Real").with_causality("local"),
            VariableDecl::new("integer_1_rx", 11, "Integer").with_causality("output"),
            VariableDecl::new("real_3_tx", 21, "Real").with_causality("input"),
            VariableDecl::new("string_rx", 41, "String").with_causality("output"),
            VariableDecl::new("Boolean_1_rx", 30, "Boolean").with_causality("output"),
            VariableDecl::new("integer_3_tx", 12, "Integer").with_causality("input"),
            VariableDecl::new("real_2_tx", 22, "Real").with_causality("input"),
            VariableDecl::new("string_ascii85_rx", 42, "String")
                .with_causality("output")
                .with_encoding("ascii85"),
            VariableDecl::new("string_ascii85_tx", 43, "String")
                .with_causality("input")
                .with_encoding("ascii85"),
        ]
    }

    #[test]
    fn test_classified_order() {
        let sorted = classify(&sort_fixture());
        let names: Vec<&str> = sorted.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "integer_2_rx",
                "integer_1_rx",
                "integer_3_tx",
                "real_4_local",
                "real_1_rx",
                "real_3_tx",
                "real_2_tx",
                "Boolean_1_rx",
                "Boolean_2_tx",
                "string_rx",
                "string_ascii85_rx",
                "string_tx",
                "string_ascii85_tx",
            ]
        );
    }

    #[test]
    fn test_stability_within_buckets() {
        // Swapping two variables that share a classification key only swaps
        // their relative order; everything else is unchanged.
        let mut decls = sort_fixture();
        let a = decls.iter().position(|d| d.name == "real_3_tx").unwrap();
        let b = decls.iter().position(|d| d.name == "real_2_tx").unwrap();
        decls.swap(a, b);
        let swapped: Vec<String> = classify(&decls).iter().map(|v| v.name.clone()).collect();
        let baseline: Vec<String> = classify(&sort_fixture())
            .iter()
            .map(|v| v.name.clone())
            .collect();

        for (i, name) in baseline.iter().enumerate() {
            if name == "real_3_tx" {
                assert_eq!(swapped[i], "real_2_tx");
            } else if name == "real_2_tx" {
                assert_eq!(swapped[i], "real_3_tx");
            } else {
                assert_eq!(&swapped[i], name);
            }
        }
    }

    #[test]
    fn test_undecodable_variables_are_dropped() {
        let mut decls = sort_fixture();
        decls.push(VariableDecl::new("mystery", 99, "Quaternion"));
        decls.push(VariableDecl::new("askew", 98, "Real").with_causality("sideways"));
        let sorted = classify(&decls);
        assert_eq!(sorted.len(), 13);
        assert!(sorted.iter().all(|v| v.name != "mystery" && v.name != "askew"));
    }

    #[test]
    fn test_empty_declaration_list() {
        assert!(classify(&[]).is_empty());
    }
}
