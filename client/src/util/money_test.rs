use super::*;

fn thb() -> CurrencyFormat {
    CurrencyFormat::new("th-TH", "THB")
}

// =============================================================
// conversions
// =============================================================

#[test]
fn to_display_divides_by_hundred() {
    assert!((to_display(150_000) - 1500.0).abs() < f64::EPSILON);
    assert!((to_display(-1) - -0.01).abs() < f64::EPSILON);
    assert!(to_display(0).abs() < f64::EPSILON);
}

#[test]
fn to_minor_units_rounds_to_nearest() {
    assert_eq!(to_minor_units(19.99), 1999);
    assert_eq!(to_minor_units(0.1 + 0.2), 30);
    assert_eq!(to_minor_units(12.345_6), 1235);
    assert_eq!(to_minor_units(-4.004), -400);
}

#[test]
fn to_minor_units_non_finite_is_zero() {
    assert_eq!(to_minor_units(f64::NAN), 0);
    assert_eq!(to_minor_units(f64::INFINITY), 0);
    assert_eq!(to_minor_units(f64::NEG_INFINITY), 0);
}

#[test]
fn minor_units_survive_display_round_trip() {
    for n in -20_000..=20_000 {
        assert_eq!(to_minor_units(to_display(n)), n, "{n}");
    }
    for n in [999_999_999, 123_456_789_012, -987_654_321_098, 4_503_599_627_370] {
        assert_eq!(to_minor_units(to_display(n)), n, "{n}");
    }
}

// =============================================================
// formatting
// =============================================================

#[test]
fn none_formats_as_zero() {
    assert_eq!(thb().format_display_price(None), "฿0.00");
    assert_eq!(CurrencyFormat::new("de-DE", "EUR").format_display_price(None), "0,00\u{a0}€");
}

#[test]
fn default_format_is_thai_baht() {
    assert_eq!(CurrencyFormat::default(), thb());
}

#[test]
fn formats_two_decimals_with_grouping() {
    assert_eq!(thb().format_display_price(Some(150_000)), "฿1,500.00");
    assert_eq!(thb().format_display_price(Some(5)), "฿0.05");
    assert_eq!(thb().format_display_price(Some(123_456_789)), "฿1,234,567.89");
}

#[test]
fn negative_sign_precedes_symbol() {
    assert_eq!(CurrencyFormat::new("en-US", "USD").format_display_price(Some(-250)), "-$2.50");
    assert_eq!(thb().format_display_price(Some(i64::MIN)), "-฿92,233,720,368,547,758.08");
}

#[test]
fn locale_controls_separators_and_placement() {
    assert_eq!(CurrencyFormat::new("en-GB", "GBP").format_display_price(Some(123_450)), "£1,234.50");
    assert_eq!(CurrencyFormat::new("de-DE", "EUR").format_display_price(Some(123_450)), "1.234,50\u{a0}€");
    assert_eq!(CurrencyFormat::new("fr-FR", "EUR").format_display_price(Some(123_450)), "1\u{202f}234,50\u{a0}€");
    assert_eq!(CurrencyFormat::new("ja-JP", "JPY").format_display_price(Some(100_000)), "¥1,000.00");
}

#[test]
fn unknown_locale_and_currency_fall_back() {
    assert_eq!(CurrencyFormat::new("xx-YY", "chf").format_display_price(Some(9_995)), "CHF 99.95");
    assert_eq!(CurrencyFormat::new("de_AT", "SEK").format_display_price(Some(100_000)), "1.000,00\u{a0}SEK");
}

#[test]
fn format_major_rounds_then_formats() {
    assert_eq!(thb().format_major(Some(1500.0)), "฿1,500.00");
    assert_eq!(thb().format_major(Some(0.125)), "฿0.13");
    assert_eq!(thb().format_major(None), "฿0.00");
    assert_eq!(thb().format_major(Some(f64::NAN)), "฿0.00");
}

// =============================================================
// parsing
// =============================================================

#[test]
fn parses_formatted_amounts() {
    assert_eq!(thb().parse_display_amount("฿1,234.50"), Some(123_450));
    assert_eq!(thb().parse_display_amount(" 1500 "), Some(150_000));
    assert_eq!(thb().parse_display_amount("THB 7.5"), Some(750));
    assert_eq!(thb().parse_display_amount(".99"), Some(99));
    assert_eq!(thb().parse_display_amount("-฿2.00"), Some(-200));
}

#[test]
fn parses_locale_separators() {
    let eur = CurrencyFormat::new("de-DE", "EUR");
    assert_eq!(eur.parse_display_amount("1.234,50 €"), Some(123_450));
    let fr = CurrencyFormat::new("fr-FR", "EUR");
    assert_eq!(fr.parse_display_amount("1\u{202f}234,50\u{a0}€"), Some(123_450));
}

#[test]
fn rejects_garbage() {
    for raw in ["", "-", "abc", "1.2.3", "1.234", "12x", "$5"] {
        assert_eq!(thb().parse_display_amount(raw), None, "{raw:?}");
    }
}

#[test]
fn formatted_prices_parse_back() {
    for format in [thb(), CurrencyFormat::new("de-DE", "EUR"), CurrencyFormat::new("fr-FR", "EUR")] {
        for minor in [0, 1, 99, 100, 123_456_789, -4_200] {
            let text = format.format_display_price(Some(minor));
            assert_eq!(format.parse_display_amount(&text), Some(minor), "{text}");
        }
    }
}
