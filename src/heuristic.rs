//! The scalar distance `h(value, target)` that ranks candidates during
//! refinement (spec.md §4.1). Grounded on `original_source/aicpp/include/
//! aicpp/utility.h`'s `cost`/`heuristic<S,T>` cascade: numeric pairs share an
//! `|value - target|` core with a same-type/cross-type penalty, string pairs
//! add a substring match-count term, grid pairs dispatch on shape, and
//! anything else falls back to the dominant sentinel.

use crate::value::Value;

/// Dominates every bounded per-element cost within a single synthesis call
/// (spec.md §4.1); not otherwise semantically significant.
pub const SENTINEL: f64 = 1000.0;

/// `|initCost + |val - target||`, the original's numeric core.
fn cost(init_cost: f64, val: f64, target: f64) -> f64 {
    (init_cost + (val - target).abs()).abs()
}

fn numeric(target: f64) -> impl Fn(f64, f64) -> f64 {
    move |val, penalty| cost(penalty, val, target)
}

/// `value` and `target` as `f64`, if both are numeric scalars, tagged with
/// whether they share the exact same numeric tag (same-type penalty 0,
/// cross-type penalty 2; `int`/`long` is special-cased to 1 per §3.1).
fn as_numeric(v: &Value) -> Option<(f64, &'static str)> {
    match v {
        Value::Bool(b) => Some((*b as i64 as f64, "bool")),
        Value::Int(i) => Some((*i as f64, "int")),
        Value::Long(l) => Some((*l as f64, "long")),
        Value::Float(f) => Some((*f as f64, "float")),
        Value::Double(d) => Some((*d, "double")),
        _ => None,
    }
}

fn numeric_penalty(a: &str, b: &str) -> f64 {
    if a == b {
        0.0
    } else if (a == "int" && b == "long") || (a == "long" && b == "int") {
        1.0
    } else {
        2.0
    }
}

/// Count of (possibly overlapping) occurrences of `needle` in `haystack`.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        start += pos + 1;
        if start >= haystack.len() {
            break;
        }
    }
    count
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[b.len()]
}

/// String-vs-string distance per §3.1's exact formula:
/// `cost + 1 - 1/occurrences + 1/(1+|shorter|) - 1/(1+|longer|)` when one is a
/// substring of the other, else `cost + levenshtein(a,b) + 1/(1+|a|) -
/// 1/(1+|b|)`, where `cost` is the string-convertible penalty (0 here, since
/// both operands are already strings).
fn string_distance(value: &str, target: &str) -> f64 {
    let (shorter, longer) = if value.len() <= target.len() {
        (value, target)
    } else {
        (target, value)
    };
    if !shorter.is_empty() && longer.contains(shorter) {
        let occurrences = count_occurrences(longer, shorter).max(1) as f64;
        1.0 - 1.0 / occurrences + 1.0 / (1.0 + shorter.len() as f64) - 1.0 / (1.0 + longer.len() as f64)
    } else {
        let dist = levenshtein(value, target) as f64;
        dist + 1.0 / (1.0 + value.len() as f64) - 1.0 / (1.0 + target.len() as f64)
    }
}

fn grid_distance(value: &crate::value::Grid, target: &crate::value::Grid) -> f64 {
    if value.shape() == target.shape() {
        value
            .iter()
            .zip(target.iter())
            .map(|(a, b)| ((a - b) as f64).powi(2))
            .sum::<f64>()
            .sqrt()
    } else {
        let sv: i64 = value.iter().sum();
        let st: i64 = target.iter().sum();
        100.0 + (sv - st).abs() as f64
    }
}

/// `h(value, target)` per spec.md §4.1.
pub fn h(value: &Value, target: &Value) -> f64 {
    if let (Some((v, vt)), Some((t, tt))) = (as_numeric(value), as_numeric(target)) {
        return numeric(t)(v, numeric_penalty(vt, tt));
    }

    match (value, target) {
        (Value::Str(v), Value::Str(t)) => string_distance(v, t),
        (other, Value::Str(_)) if other.is_string_convertible() => 1.0 + string_distance(&other.lexical(), &target.lexical()),
        (Value::Grid(v), Value::Grid(t)) => grid_distance(v, t),
        (Value::GridVec(v), Value::GridVec(t)) if v.len() == t.len() => {
            v.iter().zip(t.iter()).map(|(a, b)| grid_distance(a, b)).sum()
        }
        _ => SENTINEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_values_are_zero_distance() {
        assert_eq!(h(&Value::Int(5), &Value::Int(5)), 0.0);
        assert_eq!(h(&Value::Str("abc".into()), &Value::Str("abc".into())), 0.0);
    }

    #[test]
    fn same_type_numeric_is_absolute_difference() {
        assert_eq!(h(&Value::Int(2), &Value::Int(5)), 3.0);
    }

    #[test]
    fn cross_type_numeric_adds_penalty() {
        assert_eq!(h(&Value::Float(2.0), &Value::Int(5)), 5.0);
        assert_eq!(h(&Value::Long(2), &Value::Int(5)), 4.0);
    }

    #[test]
    fn substring_scores_better_with_more_occurrences() {
        let one = string_distance("ab", "xabxcdx");
        let many = string_distance("ab", "xabxabxabx");
        assert!(many < one);
    }

    #[test]
    fn mismatched_tags_hit_sentinel() {
        use ndarray::array;
        let grid = Value::Grid(array![[1i64, 2]]);
        assert_eq!(h(&grid, &Value::Str("x".into())), SENTINEL);
    }

    #[test]
    fn string_convertible_non_string_gets_constant_penalty() {
        let d = h(&Value::Int(5), &Value::Str("5".into()));
        assert_eq!(d, 1.0 + string_distance("5", "5"));
    }

    #[test]
    fn same_shape_grid_uses_frobenius_norm() {
        use ndarray::array;
        let a = array![[1i64, 2], [3, 4]];
        let b = array![[1i64, 2], [3, 4]];
        assert_eq!(h(&Value::Grid(a), &Value::Grid(b)), 0.0);
    }

    #[test]
    fn different_shape_grid_uses_sum_penalty() {
        use ndarray::array;
        let a = array![[1i64, 2, 3]];
        let b = array![[1i64], [2]];
        assert_eq!(h(&Value::Grid(a), &Value::Grid(b)), 100.0 + (6 - 3i64).abs() as f64);
    }
}
