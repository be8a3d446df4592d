use cel::{Limits, Machine};
use proptest::prelude::*;

// ============================================================================
// Strategies for generating source text in printed form
// ============================================================================

/// Symbol names that cannot be mistaken for numbers.
fn symbol_name() -> impl Strategy<Value = String> {
    "[a-z!?*<>=+-][a-z0-9!?*<>=+-]{0,12}".prop_filter("Must not read as a number", |s| {
        let digits = s.strip_prefix('-').unwrap_or(s);
        digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())
    })
}

fn atom() -> impl Strategy<Value = String> {
    prop_oneof![any::<i64>().prop_map(|n| n.to_string()), symbol_name()]
}

/// Canonically printed expressions: single spaces, no padding inside parens.
fn expr() -> impl Strategy<Value = String> {
    atom().prop_recursive(4, 64, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(|items| format!("({})", items.join(" ")))
    })
}

fn read_and_print(src: &str) -> Vec<String> {
    let mut m = Machine::new(Limits::default()).unwrap();
    let values = m.read_all(src).unwrap();
    values.into_iter().map(|v| m.print(v)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn printed_form_reads_back_unchanged(e in expr()) {
        prop_assert_eq!(read_and_print(&e), vec![e.clone()]);
    }

    #[test]
    fn whitespace_between_tokens_is_insignificant(
        exprs in prop::collection::vec(expr(), 1..4),
        gap in "[ \t\r\n]{1,3}",
    ) {
        let padded = exprs
            .iter()
            .map(|e| e.replace(' ', &gap))
            .collect::<Vec<_>>()
            .join(&gap);
        prop_assert_eq!(read_and_print(&padded), exprs);
    }

    #[test]
    fn add_wraps_like_i64(a in any::<i64>(), b in any::<i64>()) {
        let mut m = Machine::new(Limits::default()).unwrap();
        let out = m.eval_str(&format!("(add {} {})", a, b)).unwrap();
        prop_assert_eq!(m.print(out[0]), a.wrapping_add(b).to_string());
    }

    #[test]
    fn mul_wraps_like_i64(a in any::<i64>(), b in any::<i64>()) {
        let mut m = Machine::new(Limits::default()).unwrap();
        let out = m.eval_str(&format!("(mul {} {})", a, b)).unwrap();
        prop_assert_eq!(m.print(out[0]), a.wrapping_mul(b).to_string());
    }
}
