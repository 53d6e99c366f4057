use std::panic;

use crate::models::AnalysisResult;

const FOOD_PREFIX: &str = "Food:";
const CALORIES_PREFIX: &str = "Calories:";
const PROTEIN_PREFIX: &str = "Protein:";
const DETAILS_PREFIX: &str = "Details:";

/// Read a `Food:` / `Calories:` / `Protein:` / `Details:` style answer into an
/// `AnalysisResult`.
///
/// Never fails. Missing lines keep their defaults, unparseable numbers become
/// 0 and the last line for a given field wins. Should parsing blow up anyway,
/// the fixed `AnalysisResult::fallback()` record is returned.
pub fn extract(response_text: &str) -> AnalysisResult {
    extract_with(response_text, parse_lines)
}

fn extract_with<F>(response_text: &str, parser: F) -> AnalysisResult
where
    F: FnOnce(&str) -> AnalysisResult + panic::UnwindSafe,
{
    panic::catch_unwind(|| parser(response_text)).unwrap_or_else(|_| {
        log::warn!("⚠️ Could not parse AI response, using fallback record");
        AnalysisResult::fallback()
    })
}

fn parse_lines(response_text: &str) -> AnalysisResult {
    let mut result = AnalysisResult::default();

    for line in response_text.lines() {
        if let Some(value) = field_value(line, FOOD_PREFIX) {
            result.food_name = value.to_string();
        } else if let Some(value) = field_value(line, CALORIES_PREFIX) {
            result.calories = parse_number(value);
        } else if let Some(value) = field_value(line, PROTEIN_PREFIX) {
            result.protein = parse_number(value);
        } else if let Some(value) = field_value(line, DETAILS_PREFIX) {
            result.details = value.to_string();
        }
    }

    log::debug!(
        "🔍 Extracted food={:?} calories={} protein={}",
        result.food_name,
        result.calories,
        result.protein
    );

    result
}

/// Single-char case mapping, as in a per-character case-insensitive compare
fn simple_lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn simple_upper(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

fn chars_match_ignore_case(a: char, b: char) -> bool {
    a == b || simple_upper(a) == simple_upper(b) || simple_lower(a) == simple_lower(b)
}

/// Trimmed text after the first colon when `line` starts with `prefix`,
/// compared character by character ignoring case.
fn field_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let mut line_chars = line.chars();
    for expected in prefix.chars() {
        let actual = line_chars.next()?;
        if !chars_match_ignore_case(actual, expected) {
            return None;
        }
    }

    let (_, rest) = line.split_once(':')?;
    Some(rest.trim())
}

/// Keep only the digits of `value`; empty or beyond `i32::MAX` yields 0.
fn parse_number(value: &str) -> u32 {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .parse::<i32>()
        .ok()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_full_response() {
        let result = extract("Food: Pizza\nCalories: 450\nProtein: 18\nDetails: Slice with cheese");

        assert_eq!(
            result,
            AnalysisResult {
                food_name: "Pizza".to_string(),
                calories: 450,
                protein: 18,
                details: "Slice with cheese".to_string(),
            }
        );
    }

    #[test]
    fn test_extract_strips_units_from_numbers() {
        let result = extract("Food: Soup\nCalories: approx 300kcal\nProtein: ~12 g");

        assert_eq!(result.calories, 300);
        assert_eq!(result.protein, 12);
    }

    #[test]
    fn test_missing_protein_defaults_to_zero() {
        let result = extract("Food: Apple\nCalories: 95\nDetails: One medium apple");

        assert_eq!(result.protein, 0);
        assert_eq!(result.calories, 95);
    }

    #[test]
    fn test_empty_input() {
        let result = extract("");

        assert_eq!(result.food_name, "Unknown Food");
        assert_eq!(result.calories, 0);
        assert_eq!(result.protein, 0);
        assert_eq!(result.details, "Analysis completed");
    }

    #[test]
    fn test_prefixes_are_case_insensitive() {
        let result = extract("food: Ramen\nCALORIES: 600\nprotein: 25\ndEtAiLs: Pork broth");

        assert_eq!(result.food_name, "Ramen");
        assert_eq!(result.calories, 600);
        assert_eq!(result.protein, 25);
        assert_eq!(result.details, "Pork broth");
    }

    #[test]
    fn test_later_lines_override_earlier_ones() {
        let result = extract("Food: Salad\nCalories: 100\nFood: Caesar salad\nCalories: 350");

        assert_eq!(result.food_name, "Caesar salad");
        assert_eq!(result.calories, 350);
    }

    #[test]
    fn test_unmatched_lines_are_ignored() {
        let response = "Here is my estimate:\n\nFood: Grilled chicken salad\n  Calories: 999\nCalories: 350\nProtein: 30\nEnjoy!";
        let result = extract(response);

        assert_eq!(result.food_name, "Grilled chicken salad");
        assert_eq!(result.calories, 350);
        assert_eq!(result.protein, 30);
        assert_eq!(result.details, "Analysis completed");
    }

    #[test]
    fn test_only_first_colon_splits() {
        let result = extract("Details: Served at 12:30: warm\r\nFood: Toast\r\n");

        assert_eq!(result.details, "Served at 12:30: warm");
        assert_eq!(result.food_name, "Toast");
    }

    #[test]
    fn test_non_numeric_and_overflowing_numbers_become_zero() {
        let result = extract("Calories: unknown\nProtein: 99999999999999999999");

        assert_eq!(result.calories, 0);
        assert_eq!(result.protein, 0);
    }

    #[test]
    fn test_numbers_beyond_i32_become_zero() {
        let result = extract("Calories: 3000000000\nProtein: 2147483648");
        assert_eq!((result.calories, result.protein), (0, 0));

        let result = extract("Calories: 2147483647\nProtein: 4294967295");
        assert_eq!((result.calories, result.protein), (2147483647, 0));
    }

    #[test]
    fn test_unrelated_non_ascii_lines_do_not_match() {
        let result = extract("Fööd: Börek\nKalori: 300\n🍕: pizza");

        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn test_prefix_case_folding_is_per_character() {
        let result = extract("DETAİLS: Dotted capital I\nFOOD: Börek");

        assert_eq!(result.details, "Dotted capital I");
        assert_eq!(result.food_name, "Börek");
    }

    #[test]
    fn test_panicking_parser_yields_fallback() {
        let result = extract_with("Food: Pizza", |_| panic!("parser bug"));

        assert_eq!(result, AnalysisResult::fallback());
    }

    #[test]
    fn test_fallback_record() {
        let fallback = AnalysisResult::fallback();

        assert_eq!(fallback.food_name, "Unknown Food");
        assert_eq!(fallback.calories, 300);
        assert_eq!(fallback.protein, 0);
        assert_eq!(fallback.details, "Could not parse AI response");
    }
}
