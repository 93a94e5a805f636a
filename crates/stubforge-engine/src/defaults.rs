//! Default-value synthesis from declared return types.
//!
//! Used when an operation is called and its plan has no configured action:
//!
//! | declared type              | default                      |
//! |----------------------------|------------------------------|
//! | `void`                     | no value                     |
//! | `bool` / `int` / `float`   | `false` / `0` / `0.0`        |
//! | `string`                   | `""`                         |
//! | sequences                  | `[]`                         |
//! | `?T`, `mixed`, `null`      | `null`                       |
//! | `self` / `static`          | the double itself            |
//! | contract or intersection   | a nested double              |
//! | union without `null`       | first member by preference   |
//! | `never`, closed contracts  | no default                   |
//!
//! Nested doubles are not built here: [`classify`] only says a double is
//! needed, and the engine builds it during its synthesis pass.

use stubforge_core::{DeclaredType, ScalarType, TypeId, TypeRegistry};

use crate::value::Value;

/// What the default return value of a type is.
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesized {
    Value(Value),
    /// The double the call was made on.
    SelfRef,
    /// A nested double of this contract or intersection type.
    NeedsDouble(TypeId),
    /// No default exists; the reason explains why.
    Unavailable(String),
}

impl Synthesized {
    /// Preference rank among union members. Lower wins.
    fn rank(&self) -> Option<u8> {
        match self {
            Synthesized::Value(Value::Bool(_)) => Some(0),
            Synthesized::Value(Value::Int(_)) => Some(1),
            Synthesized::Value(Value::Float(_)) => Some(2),
            Synthesized::Value(Value::Str(_)) => Some(3),
            Synthesized::Value(Value::Seq(_)) => Some(4),
            Synthesized::Value(_) => Some(5),
            Synthesized::SelfRef => Some(6),
            Synthesized::NeedsDouble(_) => Some(7),
            Synthesized::Unavailable(_) => None,
        }
    }
}

/// Determines the default return value for declared type `ty`.
pub fn classify(registry: &TypeRegistry, ty: TypeId) -> Synthesized {
    let Some(declared) = registry.get(ty) else {
        return Synthesized::Unavailable(format!("{ty} is not registered"));
    };

    match declared {
        DeclaredType::Void => Synthesized::Value(Value::Unit),
        DeclaredType::Scalar(ScalarType::Bool) => Synthesized::Value(Value::Bool(false)),
        DeclaredType::Scalar(ScalarType::Int) => Synthesized::Value(Value::Int(0)),
        DeclaredType::Scalar(ScalarType::Float) => Synthesized::Value(Value::Float(0.0)),
        DeclaredType::Scalar(ScalarType::String) => Synthesized::Value(Value::Str(String::new())),
        DeclaredType::Sequence { .. } => Synthesized::Value(Value::Seq(Vec::new())),
        DeclaredType::Nullable { .. } | DeclaredType::Mixed | DeclaredType::Null => {
            Synthesized::Value(Value::Null)
        }
        DeclaredType::SelfRef => Synthesized::SelfRef,
        DeclaredType::Contract(def) if def.kind.is_doubleable() => Synthesized::NeedsDouble(ty),
        DeclaredType::Contract(def) => Synthesized::Unavailable(format!(
            "declared return type '{}' is a {}",
            def.name,
            def.kind.label()
        )),
        DeclaredType::Declared { name } => {
            Synthesized::Unavailable(format!("contract '{name}' is declared but not defined"))
        }
        DeclaredType::Intersection { .. } => Synthesized::NeedsDouble(ty),
        DeclaredType::Never => {
            Synthesized::Unavailable("declared return type is never".to_string())
        }
        DeclaredType::Union { members } => {
            if members.iter().any(|m| admits_null(registry, *m)) {
                return Synthesized::Value(Value::Null);
            }
            members
                .iter()
                .map(|m| classify(registry, *m))
                .filter_map(|s| s.rank().map(|r| (r, s)))
                .min_by_key(|(r, _)| *r)
                .map(|(_, s)| s)
                .unwrap_or_else(|| {
                    Synthesized::Unavailable(format!(
                        "no member of '{}' has a default value",
                        registry.display_name(ty)
                    ))
                })
        }
    }
}

fn admits_null(registry: &TypeRegistry, ty: TypeId) -> bool {
    match registry.get(ty) {
        Some(DeclaredType::Union { members }) => members.iter().any(|m| admits_null(registry, *m)),
        Some(declared) => declared.admits_null(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubforge_core::{load_contracts, resolve_type_expr};

    fn registry() -> TypeRegistry {
        load_contracts(
            r#"{ "contracts": [
                { "name": "Logger" },
                { "name": "Clock" },
                { "name": "Money", "kind": "final_class" }
            ] }"#,
        )
        .unwrap()
    }

    fn default_of(reg: &mut TypeRegistry, expr: &str) -> Synthesized {
        let ty = resolve_type_expr(reg, expr).unwrap();
        classify(reg, ty)
    }

    #[test]
    fn scalar_defaults() {
        let mut reg = registry();
        assert_eq!(default_of(&mut reg, "void"), Synthesized::Value(Value::Unit));
        assert_eq!(default_of(&mut reg, "bool"), Synthesized::Value(Value::Bool(false)));
        assert_eq!(default_of(&mut reg, "int"), Synthesized::Value(Value::Int(0)));
        assert_eq!(default_of(&mut reg, "float"), Synthesized::Value(Value::Float(0.0)));
        assert_eq!(default_of(&mut reg, "string"), Synthesized::Value(Value::Str(String::new())));
        assert_eq!(default_of(&mut reg, "array"), Synthesized::Value(Value::Seq(vec![])));
        assert_eq!(default_of(&mut reg, "list<Logger>"), Synthesized::Value(Value::Seq(vec![])));
    }

    #[test]
    fn nullable_prefers_null() {
        let mut reg = registry();
        assert_eq!(default_of(&mut reg, "?int"), Synthesized::Value(Value::Null));
        assert_eq!(default_of(&mut reg, "?Logger"), Synthesized::Value(Value::Null));
        assert_eq!(default_of(&mut reg, "mixed"), Synthesized::Value(Value::Null));
        assert_eq!(default_of(&mut reg, "Logger|null"), Synthesized::Value(Value::Null));
        assert_eq!(default_of(&mut reg, "(int|?string)|Clock"), Synthesized::Value(Value::Null));
    }

    #[test]
    fn contracts_need_doubles() {
        let mut reg = registry();
        let logger = reg.get_by_name("Logger").unwrap();
        assert_eq!(default_of(&mut reg, "Logger"), Synthesized::NeedsDouble(logger));
        assert!(matches!(
            default_of(&mut reg, "Logger&Clock"),
            Synthesized::NeedsDouble(_)
        ));
        assert_eq!(default_of(&mut reg, "static"), Synthesized::SelfRef);
    }

    #[test]
    fn unions_pick_by_preference() {
        let mut reg = registry();
        assert_eq!(default_of(&mut reg, "string|int"), Synthesized::Value(Value::Int(0)));
        assert_eq!(default_of(&mut reg, "Logger|array"), Synthesized::Value(Value::Seq(vec![])));
        assert_eq!(default_of(&mut reg, "Logger|static"), Synthesized::SelfRef);
        assert_eq!(
            default_of(&mut reg, "Money|Logger"),
            Synthesized::NeedsDouble(reg.get_by_name("Logger").unwrap())
        );
    }

    #[test]
    fn no_default_for_never_and_closed_contracts() {
        let mut reg = registry();
        assert!(matches!(default_of(&mut reg, "never"), Synthesized::Unavailable(_)));
        match default_of(&mut reg, "Money") {
            Synthesized::Unavailable(reason) => assert!(reason.contains("final class"), "{reason}"),
            other => panic!("expected Unavailable, got {:?}", other),
        }
        assert!(matches!(classify(&reg, TypeId(999)), Synthesized::Unavailable(_)));
    }
}
