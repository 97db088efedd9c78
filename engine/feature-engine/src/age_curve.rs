//! Age-based performance multiplier

/// Multiplier for a player's age, 1.0 when the age is unknown
///
/// Prime years (23-29) are neutral. The curve drops from 1.0 to 0.97 at 30 and
/// steepens after 33. Ages outside every bracket take the post-33 formula.
pub fn age_adjustment(age: Option<f64>) -> f64 {
    let Some(age) = age.filter(|a| a.is_finite()) else {
        return 1.0;
    };

    if age < 23.0 {
        0.95 + (age - 20.0) * 0.025
    } else if (23.0..=29.0).contains(&age) {
        1.0
    } else if (30.0..=33.0).contains(&age) {
        1.0 - (age - 29.0) * 0.03
    } else {
        // Also catches fractional ages strictly between 29 and 30
        0.88 - (age - 33.0) * 0.05
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_points() {
        assert_eq!(age_adjustment(Some(27.0)), 1.0);
        assert_eq!(age_adjustment(None), 1.0);
        assert_eq!(age_adjustment(Some(f64::NAN)), 1.0);
        assert!(close(age_adjustment(Some(20.0)), 0.95));
        assert!(close(age_adjustment(Some(35.0)), 0.78));
    }

    #[test]
    fn test_boundaries() {
        assert!(close(age_adjustment(Some(22.0)), 1.0));
        assert_eq!(age_adjustment(Some(23.0)), 1.0);
        assert_eq!(age_adjustment(Some(29.0)), 1.0);
        assert!(close(age_adjustment(Some(30.0)), 0.97));
        assert!(close(age_adjustment(Some(33.0)), 0.88));
        assert!(close(age_adjustment(Some(34.0)), 0.83));
    }

    #[test]
    fn test_fractional_age_between_brackets() {
        assert!(close(age_adjustment(Some(29.5)), 1.055));
        assert!(close(age_adjustment(Some(33.5)), 0.855));
    }

    #[test]
    fn test_young_players() {
        assert!(close(age_adjustment(Some(19.0)), 0.925));
        assert!(close(age_adjustment(Some(21.5)), 0.9875));
    }
}
