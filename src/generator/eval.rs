//! The static-mode interpreter: evaluates expressions in Rust and bakes the
//! results into literals.

use super::expr::{GenExpr, TextKind, MAP_KEY_LENGTH, MAX_SAFE_INTEGER};
use super::fake;
use super::pattern::generate_matching;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};

/// Interprets expressions in-process.
///
/// Used for static output: every evaluable node is computed once and frozen
/// into a literal.
#[derive(Debug)]
pub struct Evaluator<R> {
    rng: R,
}

impl<R: Rng> Evaluator<R> {
    pub fn new(rng: R) -> Self {
        Evaluator { rng }
    }

    /// Produce one value. External calls cannot run here and evaluate to `null`;
    /// use [`Evaluator::bake`] to keep them.
    pub fn eval(&mut self, expr: &GenExpr) -> Value {
        match expr {
            GenExpr::Literal(value) => value.clone(),
            GenExpr::Pick(values) => values.choose(&mut self.rng).cloned().unwrap_or(Value::Null),
            GenExpr::OneOf(branches) => match branches.choose(&mut self.rng) {
                Some(branch) => self.eval(branch),
                None => Value::Null,
            },
            GenExpr::Int { min, max } => {
                let (lo, hi) = int_range(*min, *max);
                Value::from(self.rng.gen_range(lo..=hi))
            }
            GenExpr::Bool => Value::Bool(self.rng.gen()),
            GenExpr::Text(kind) => Value::String(fake::text(*kind, &mut self.rng)),
            GenExpr::Alpha { min, max } => Value::String(fake::alpha(*min, *max, &mut self.rng)),
            GenExpr::Pattern(source) => Value::String(
                generate_matching(source, &mut self.rng)
                    .unwrap_or_else(|| fake::text(TextKind::Words, &mut self.rng)),
            ),
            GenExpr::Object(fields) => {
                let mut map = Map::new();
                for (key, field) in fields {
                    map.insert(key.clone(), self.eval(field));
                }
                Value::Object(map)
            }
            GenExpr::Map { entries, value } => {
                let mut map = Map::new();
                for _ in 0..*entries {
                    let key = fake::alphanumeric(MAP_KEY_LENGTH, &mut self.rng);
                    map.insert(key, self.eval(value));
                }
                Value::Object(map)
            }
            GenExpr::Array { min, max, item } => {
                let len = self.rng.gen_range(*min..=(*max).max(*min));
                Value::Array((0..len).map(|_| self.eval(item)).collect())
            }
            GenExpr::Ask(_) => {
                tracing::debug!("external call cannot be evaluated in-process; using null");
                Value::Null
            }
            GenExpr::Null => Value::Null,
        }
    }

    /// Fold every subtree that does not reach an external call into a literal.
    ///
    /// Objects are baked field by field so a deferred call nested inside keeps
    /// its siblings frozen; other containers holding a call are kept as is.
    pub fn bake(&mut self, expr: &GenExpr) -> GenExpr {
        if !expr.contains_ask() {
            return GenExpr::Literal(self.eval(expr));
        }
        match expr {
            GenExpr::Object(fields) => GenExpr::Object(
                fields
                    .iter()
                    .map(|(key, field)| (key.clone(), self.bake(field)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Missing bounds default to `0` and `MAX_SAFE_INTEGER`, except that a lone
/// negative maximum reaches down to `-MAX_SAFE_INTEGER`. An inverted range
/// collapses onto the minimum.
fn int_range(min: Option<i64>, max: Option<i64>) -> (i64, i64) {
    let lo = match (min, max) {
        (Some(lo), _) => lo,
        (None, Some(hi)) if hi < 0 => -MAX_SAFE_INTEGER,
        (None, _) => 0,
    };
    let hi = max.unwrap_or(MAX_SAFE_INTEGER).max(lo);
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn evaluator(seed: u64) -> Evaluator<StdRng> {
        Evaluator::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_pick_stays_within_enum() {
        let mut ev = evaluator(3);
        let expr = GenExpr::Pick(vec![json!("a"), json!("b")]);
        for _ in 0..200 {
            let v = ev.eval(&expr);
            assert!(v == json!("a") || v == json!("b"));
        }
    }

    #[test]
    fn test_int_bounds_and_collapsed_range() {
        let mut ev = evaluator(4);
        for _ in 0..200 {
            let v = ev.eval(&GenExpr::Int { min: Some(-2), max: Some(3) }).as_i64().unwrap();
            assert!((-2..=3).contains(&v));
        }
        assert_eq!(
            ev.eval(&GenExpr::Int { min: Some(5), max: Some(1) }),
            json!(5)
        );
        let unbounded = ev.eval(&GenExpr::Int { min: None, max: None }).as_i64().unwrap();
        assert!((0..=MAX_SAFE_INTEGER).contains(&unbounded));
    }

    #[test]
    fn test_int_one_sided_bounds() {
        let mut ev = evaluator(9);
        for _ in 0..200 {
            let below = ev.eval(&GenExpr::Int { min: None, max: Some(-5) }).as_i64().unwrap();
            assert!((-MAX_SAFE_INTEGER..=-5).contains(&below), "{below} exceeds -5");
            let capped = ev.eval(&GenExpr::Int { min: None, max: Some(5) }).as_i64().unwrap();
            assert!((0..=5).contains(&capped));
            let above = ev.eval(&GenExpr::Int { min: Some(-3), max: None }).as_i64().unwrap();
            assert!((-3..=MAX_SAFE_INTEGER).contains(&above));
        }
        assert_eq!(
            ev.eval(&GenExpr::Int { min: Some(MAX_SAFE_INTEGER), max: None }),
            json!(MAX_SAFE_INTEGER)
        );
    }

    #[test]
    fn test_compiled_negative_maximum_is_respected() {
        use crate::generator::compile::Compiler;
        use crate::spec::SchemaNode;

        let schema = SchemaNode::from_value(&json!({ "type": "integer", "maximum": -5 }));
        let expr = Compiler::default().compile(&schema, None);
        let mut ev = evaluator(10);
        for _ in 0..200 {
            let v = ev.eval(&expr).as_i64().unwrap();
            assert!(v <= -5, "static value {v} exceeds maximum -5");
        }
    }

    #[test]
    fn test_array_length_in_range() {
        let mut ev = evaluator(5);
        let expr = GenExpr::Array { min: 2, max: 4, item: Box::new(GenExpr::Bool) };
        for _ in 0..100 {
            let len = ev.eval(&expr).as_array().unwrap().len();
            assert!((2..=4).contains(&len));
        }
        let collapsed = GenExpr::Array { min: 3, max: 3, item: Box::new(GenExpr::Null) };
        assert_eq!(ev.eval(&collapsed), json!([null, null, null]));
    }

    #[test]
    fn test_map_has_fixed_entry_count() {
        let mut ev = evaluator(6);
        let v = ev.eval(&GenExpr::Map { entries: 5, value: Box::new(GenExpr::Bool) });
        let map = v.as_object().unwrap();
        assert_eq!(map.len(), 5);
        assert!(map.keys().all(|k| k.len() == MAP_KEY_LENGTH));
    }

    #[test]
    fn test_object_keeps_order() {
        let mut ev = evaluator(7);
        let v = ev.eval(&GenExpr::Object(vec![
            ("z".into(), GenExpr::Null),
            ("a".into(), GenExpr::Literal(json!(1))),
        ]));
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"z":null,"a":1}"#);
    }

    #[test]
    fn test_bake_freezes_and_keeps_ask() {
        let mut ev = evaluator(8);
        let baked = ev.bake(&GenExpr::Text(TextKind::Uuid));
        assert!(matches!(baked, GenExpr::Literal(Value::String(_))));

        let ask = GenExpr::Ask(json!({ "path": "/pets" }));
        assert_eq!(ev.bake(&ask), ask);

        let mixed = GenExpr::Object(vec![
            ("id".into(), GenExpr::Bool),
            ("detail".into(), ask.clone()),
        ]);
        match ev.bake(&mixed) {
            GenExpr::Object(fields) => {
                assert!(matches!(fields[0].1, GenExpr::Literal(Value::Bool(_))));
                assert_eq!(fields[1].1, ask);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_same_seed_bakes_same_literal() {
        let expr = GenExpr::Object(vec![
            ("name".into(), GenExpr::Text(TextKind::FullName)),
            ("n".into(), GenExpr::Int { min: Some(0), max: Some(1000) }),
        ]);
        assert_eq!(evaluator(11).bake(&expr), evaluator(11).bake(&expr));
    }
}
