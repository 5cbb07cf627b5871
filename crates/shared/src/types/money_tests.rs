use super::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[rstest]
#[case(dec!(1.23455), dec!(1.2346))]
#[case(dec!(1.23454), dec!(1.2345))]
#[case(dec!(-1.23455), dec!(-1.2346))]
#[case(dec!(120634.920634920), dec!(120634.9206))]
fn test_round_internal_half_up(#[case] input: Decimal, #[case] expected: Decimal) {
    assert_eq!(round_internal(input), expected);
}

#[rstest]
#[case(dec!(2.345), dec!(2.35))]
#[case(dec!(2.344), dec!(2.34))]
#[case(dec!(0.005), dec!(0.01))]
fn test_round_report_half_up(#[case] input: Decimal, #[case] expected: Decimal) {
    assert_eq!(round_report(input), expected);
}

#[test]
fn test_constants() {
    assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
    assert_eq!(QUANTITY_EPSILON, dec!(0.0001));
}

#[test]
fn test_effectively_zero() {
    assert!(is_effectively_zero(dec!(0.0001)));
    assert!(is_effectively_zero(dec!(-0.00005)));
    assert!(!is_effectively_zero(dec!(0.0002)));
    assert!(is_effectively_zero(Decimal::ZERO));
}

#[test]
fn test_approx_eq() {
    assert!(approx_eq(dec!(100.00), dec!(100.01), BALANCE_TOLERANCE));
    assert!(!approx_eq(dec!(100.00), dec!(100.02), BALANCE_TOLERANCE));
}
