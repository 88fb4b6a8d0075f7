//! Selector tables for the field heuristics, parsed once.

use once_cell::sync::Lazy;
use vaultbridge_dom::SelectorList;

fn list(source: &str) -> SelectorList {
    SelectorList::parse(source).expect("valid selector")
}

fn lists(sources: &[&str]) -> Vec<SelectorList> {
    sources.iter().map(|s| list(s)).collect()
}

pub(crate) static PASSWORD: Lazy<SelectorList> = Lazy::new(|| list(r#"input[type="password"]"#));

/// Username strategies in priority order.
pub(crate) static USERNAME_STRATEGIES: Lazy<Vec<SelectorList>> = Lazy::new(|| {
    lists(&[
        r#"input[type="email"]"#,
        r#"input[type="text"][name*="user"], input[type="text"][name*="email"],
           input[type="text"][id*="user"], input[type="text"][id*="email"]"#,
        r#"input[type="text"][autocomplete="username"], input[type="text"][autocomplete="email"]"#,
        r#"input[type="tel"]"#,
        r#"input[type="number"]"#,
        r#"input[type="text"][name*="kimlik"], input[type="text"][id*="kimlik"],
           input[type="text"][name*="identity"], input[type="text"][id*="identity"]"#,
    ])
});

pub(crate) static USERNAME_FALLBACK: Lazy<SelectorList> = Lazy::new(|| {
    list(r#"input[type="text"], input[type="email"], input[type="tel"], input[type="number"]"#)
});

pub(crate) static SUBMIT_CONTROLS: Lazy<SelectorList> = Lazy::new(|| {
    list(r#"button[type="submit"], input[type="submit"], button, [role="button"]"#)
});

pub(crate) static CARD_NUMBER: Lazy<SelectorList> = Lazy::new(|| {
    list(
        r#"input[autocomplete*="cc-number"], input[autocomplete*="card"],
           input[name*="card"], input[id*="card"],
           input[name*="cardnumber"], input[id*="cardnumber"],
           input[name*="cardNumber"], input[id*="cardNumber"],
           input[type="tel"][maxlength="19"], input[type="tel"][maxlength="16"],
           input[inputmode="numeric"], input[maxlength="19"], input[maxlength="16"]"#,
    )
});

/// Explicit card-number autocomplete hint; overrides role look-alikes.
pub(crate) static CARD_NUMBER_HINT: Lazy<SelectorList> =
    Lazy::new(|| list(r#"input[autocomplete*="cc-number"]"#));

pub(crate) static CARDHOLDER_NAME: Lazy<Vec<SelectorList>> = Lazy::new(|| {
    lists(&[
        r#"input[autocomplete="cc-name"]"#,
        r#"input[name*="name"]"#,
        r#"input[id*="name"]"#,
        r#"input[name*="cardholder"]"#,
        r#"input[name="cc_owner"]"#,
        r#"input[id="cc_owner"]"#,
        r#"input[name*="owner"]"#,
        r#"input[id*="owner"]"#,
    ])
});

pub(crate) static COMBINED_EXPIRY: Lazy<Vec<SelectorList>> = Lazy::new(|| {
    lists(&[
        r#"input[autocomplete="cc-exp"]"#,
        r#"input[name*="expir"]"#,
        r#"input[id*="expir"]"#,
        r#"input[name="expiryDate"]"#,
        r#"input[id="expiryDate"]"#,
        r#"input[placeholder*="MM"]"#,
        r#"input[placeholder*="YY"]"#,
    ])
});

pub(crate) static EXPIRY_MONTH: Lazy<Vec<SelectorList>> = Lazy::new(|| {
    lists(&[
        r#"input[autocomplete="cc-exp-month"]"#,
        r#"select[autocomplete="cc-exp-month"]"#,
        r#"input[name*="month"]"#,
        r#"select[name*="month"]"#,
    ])
});

pub(crate) static EXPIRY_YEAR: Lazy<Vec<SelectorList>> = Lazy::new(|| {
    lists(&[
        r#"input[autocomplete="cc-exp-year"]"#,
        r#"select[autocomplete="cc-exp-year"]"#,
        r#"input[name*="year"]"#,
        r#"select[name*="year"]"#,
    ])
});

pub(crate) static CVV: Lazy<Vec<SelectorList>> = Lazy::new(|| {
    lists(&[
        r#"input[autocomplete="cc-csc"]"#,
        r#"input[name*="cvv"]"#,
        r#"input[id*="cvv"]"#,
        r#"input[name*="cvc"]"#,
        r#"input[id*="cvc"]"#,
        r#"input[name*="security"]"#,
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_parse() {
        assert_eq!(USERNAME_STRATEGIES.len(), 6);
        assert_eq!(USERNAME_STRATEGIES[1].selectors().len(), 4);
        assert_eq!(CARD_NUMBER.selectors().len(), 13);
        assert_eq!(SUBMIT_CONTROLS.selectors().len(), 4);
        assert_eq!(CARDHOLDER_NAME.len(), 8);
        assert_eq!(COMBINED_EXPIRY.len(), 7);
        assert_eq!(EXPIRY_MONTH.len() + EXPIRY_YEAR.len(), 8);
        assert_eq!(CVV.len(), 6);
        assert!(!PASSWORD.as_str().is_empty());
        assert!(!USERNAME_FALLBACK.as_str().is_empty());
        assert!(!CARD_NUMBER_HINT.as_str().is_empty());
    }
}
