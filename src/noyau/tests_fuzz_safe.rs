//! Tests fuzz safe : robustesse + déterminisme, par propriétés (proptest).
//!
//! - entrées arbitraires : jamais de panique, toujours Ok ou Err
//! - expressions bien formées : seules des erreurs arithmétiques possibles
//! - entiers en contexte exact : accord avec un calcul i128
//! - RPN rendue puis relue en infixe : même valeur
//! - exposants jusqu'aux bornes d'un i64 : erreur, jamais de panique
//!
//! Pas de `^` dans l'alphabet libre : 9^9999999 produirait des entiers
//! de plusieurs millions de chiffres.

use proptest::prelude::*;

use super::decimal::Decimal;
use super::expression::Expression;

/* ------------------------ Stratégies ------------------------ */

fn nombre() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..100).prop_map(|n| n.to_string()),
        (0u32..1000, 1u32..100).prop_map(|(a, b)| format!("{a}.{b}")),
        Just("x".to_string()),
        Just("PI".to_string()),
    ]
}

/// Expressions bien formées, profondeur bornée.
fn expression() -> impl Strategy<Value = String> {
    nombre().prop_recursive(4, 32, 3, |interne| {
        prop_oneof![
            (
                interne.clone(),
                prop::sample::select(vec!["+", "-", "*", "/", "%", "<", ">=", "==", "&&", "||"]),
                interne.clone(),
            )
                .prop_map(|(a, op, b)| format!("({a} {op} {b})")),
            interne.clone().prop_map(|a| format!("-({a})")),
            (interne.clone(), interne.clone()).prop_map(|(a, b)| format!("MAX({a}, {b})")),
            interne.clone().prop_map(|a| format!("abs({a})")),
            (interne.clone(), interne.clone(), interne.clone())
                .prop_map(|(c, a, b)| format!("IF({c}, {a}, {b})")),
            // multiplication implicite
            (interne.clone(), interne).prop_map(|(a, b)| format!("({a})({b})")),
        ]
    })
}

/// Littéral à exposant : au-delà d'un i32, comme aux bornes d'un i64.
fn litteral_a_exposant() -> impl Strategy<Value = String> {
    let exposant = prop_oneof![
        any::<i64>(),
        i64::from(i32::MIN)..=i64::from(i32::MAX),
        -400i64..400,
    ];
    (0u32..1000, exposant, any::<bool>()).prop_map(|(m, ex, plus)| {
        if plus && ex >= 0 {
            format!("{m}e+{ex}")
        } else {
            format!("{m}E{ex}")
        }
    })
}

/// Réécrit une RPN rendue par `to_rpn` en infixe entièrement parenthésé.
fn infixe(rpn: &str) -> Option<String> {
    // `None` marque le début d'une liste de paramètres
    let mut pile: Vec<Option<String>> = Vec::new();
    for m in rpn.split_whitespace() {
        match m {
            "(" => pile.push(None),
            "-u" | "+u" => {
                let a = pile.pop()??;
                pile.push(Some(format!("{}({a})", &m[..1])));
            }
            "MAX" | "abs" | "IF" => {
                let mut args = Vec::new();
                while let Some(Some(a)) = pile.pop() {
                    args.push(a);
                }
                args.reverse();
                pile.push(Some(format!("{m}({})", args.join(", "))));
            }
            "+" | "-" | "*" | "/" | "%" | "<" | ">=" | "==" | "&&" | "||" => {
                let b = pile.pop()??;
                let a = pile.pop()??;
                pile.push(Some(format!("({a} {m} {b})")));
            }
            valeur => pile.push(Some(valeur.to_string())),
        }
    }
    match pile.as_slice() {
        [Some(texte)] => Some(texte.clone()),
        _ => None,
    }
}

fn evaluer(texte: &str) -> Result<Option<Decimal>, super::erreur::Error> {
    let mut e = Expression::new(texte);
    e.where_str("x", "3.5");
    e.eval()
}

/* ------------------------ Propriétés ------------------------ */

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn entree_arbitraire_sans_panique(s in "[0-9a-z+*/%(),.<>=!&| \"-]{0,24}") {
        let _ = evaluer(&s);
    }

    #[test]
    fn bien_formee_sans_erreur_de_syntaxe(texte in expression()) {
        match evaluer(&texte) {
            Ok(_) => {}
            Err(e) => prop_assert!(e.is_arithmetic(), "expr={texte:?} err={e}"),
        }
    }

    #[test]
    fn evaluation_deterministe(texte in expression()) {
        let mut e = Expression::new(&texte);
        e.where_str("x", "3.5");
        // la seconde évaluation passe par la RPN en cache
        let premier = e.eval();
        let second = e.eval();
        prop_assert_eq!(premier, second);
    }

    #[test]
    fn entiers_exacts(a in -10_000i64..10_000, b in -10_000i64..10_000, c in -10_000i64..10_000) {
        let mut e = Expression::new(&format!("{a} * ({b} - {c}) + {c}"));
        e.set_precision(0);
        let attendu = i128::from(a) * (i128::from(b) - i128::from(c)) + i128::from(c);
        let obtenu = e.eval().unwrap().unwrap();
        prop_assert_eq!(obtenu.to_plain_string(), attendu.to_string());
    }

    #[test]
    fn rpn_relue_en_infixe(texte in expression()) {
        let mut e = Expression::new(&texte);
        e.where_str("x", "3.5");
        let rpn = e.to_rpn().unwrap();
        let relu = infixe(&rpn);
        prop_assert!(relu.is_some(), "rpn={rpn:?}");
        let relu = relu.unwrap();
        prop_assert_eq!(evaluer(&relu), e.eval(), "texte={} relu={}", texte, relu);
    }

    #[test]
    fn exposants_extremes_sans_panique(
        a in litteral_a_exposant(),
        op in prop::sample::select(vec!["+", "-", "*", "/", "%", "<", ">=", "==", "&&", "||"]),
        b in prop_oneof![litteral_a_exposant(), nombre()],
    ) {
        let _ = evaluer(&a);
        let _ = evaluer(&format!("{a} {op} {b}"));
        let _ = evaluer(&format!("-{b} {op} ({a})"));
        match evaluer(&format!("{a} == {a}")) {
            Ok(v) => prop_assert_eq!(v, Some(Decimal::one())),
            Err(e) => prop_assert!(e.is_expression(), "a={a} err={e}"),
        }
    }

    #[test]
    fn sous_expression_equivalente(a in 0u32..1000, b in 1u32..1000) {
        let direct = evaluer(&format!("({a} + {b}) / {b}"));
        let mut e = Expression::new("y / b");
        e.where_str("b", &b.to_string()).where_str("y", &format!("{a} + b"));
        prop_assert_eq!(direct, e.eval());
    }
}
