// src/noyau/racines.rs
//
// Puissance à exposant décimal, racine carrée et racine n-ième.
// Newton–Raphson à précision de travail adaptative, puis retour à
// l'échelle du contexte demandé (nombre de décimales = précision).

use log::{trace, warn};

use super::decimal::{Decimal, MathContext, RoundingMode};
use super::erreur::ArithmeticError;

type Resultat<T> = Result<T, ArithmeticError>;

/// Au-delà, l'itération est déclarée non convergente.
const ITERATIONS_MAX: usize = 10_000;

fn deux() -> Decimal {
    Decimal::from(2)
}

/// 10^-k
fn puissance_de_dix_negative(k: i64) -> Resultat<Decimal> {
    Decimal::try_new(1.into(), k)
}

/// Plafond d'itérations atteint : le dernier itéré n'est gardé que si son
/// dernier pas reste sous 10^-(p+1) en relatif (cycle d'arrondi aux grandes
/// magnitudes, où le seuil absolu n'est jamais franchi).
fn plafond_atteint(nom: &'static str, r: &Decimal, pas: &Decimal, p: i64) -> Resultat<()> {
    let seuil = r.abs().mul(&puissance_de_dix_negative(p + 1)?)?;
    if pas.abs() <= seuil {
        warn!("{nom} : {ITERATIONS_MAX} itérations, dernier pas {pas} gardé");
        Ok(())
    } else {
        warn!("{nom} : pas de convergence après {ITERATIONS_MAX} itérations (pas {pas})");
        Err(ArithmeticError::NoConvergence(nom))
    }
}

/// Sans contexte de précision, on travaille comme en DECIMAL128.
fn precision_effective(mc: MathContext) -> i64 {
    if mc.is_unlimited() {
        i64::from(MathContext::DECIMAL128.precision)
    } else {
        i64::from(mc.precision)
    }
}

fn contexte(precision: i64, rounding: RoundingMode) -> MathContext {
    MathContext::new(u32::try_from(precision).unwrap_or(u32::MAX), rounding)
}

/* ------------------------ Puissance ------------------------ */

/// `base ^ exposant` : partie entière exacte (carré-multiplication sous `mc`),
/// partie fractionnaire en flottant, recombinées sous `mc`.
/// Exposant négatif : inverse sous `mc`.
pub fn puissance(base: &Decimal, exposant: &Decimal, mc: MathContext) -> Resultat<Decimal> {
    let signe = exposant.signum();
    let e = exposant.abs();
    if e.adjusted_exponent() > 9 {
        return Err(ArithmeticError::Overflow);
    }

    let fraction = e.rem(&Decimal::one(), MathContext::UNLIMITED)?;
    let entier = e.sub(&fraction).to_i32_exact()?;

    let pow_entier = base.pow_int(i64::from(entier), mc)?;
    let pow_flottant = base.to_f64().powf(fraction.to_f64());
    let pow_fraction = Decimal::from_f64(pow_flottant).ok_or(ArithmeticError::NotFinite)?;

    let r = pow_entier.mul_ctx(&pow_fraction, mc)?;
    if signe < 0 {
        Decimal::one().div(&r, mc)
    } else {
        Ok(r)
    }
}

/* ------------------------ Racine carrée ------------------------ */

/// √x à `mc.precision` décimales.
///
/// Amorce : √ flottant si x tient dans un f64, sinon x/2.
/// Travail en HALF_DOWN à 2p chiffres, doublés à chaque tour (plafond 2p+6),
/// jusqu'à un écart entre deux itérés ≤ 10^-(2p+1).
pub fn racine_carree(x: &Decimal, mc: MathContext) -> Resultat<Decimal> {
    if x.is_zero() {
        return Ok(Decimal::zero());
    }
    if x.is_negative() {
        return Err(ArithmeticError::Domain(
            "Argument to SQRT() function must not be negative".into(),
        ));
    }

    let p = precision_effective(mc);
    let travail = 2 * p;
    let plafond = travail + 6;
    let erreur_acceptable = puissance_de_dix_negative(travail + 1)?;
    let mc_sortie = contexte(p, mc.rounding);

    let estimation = x.to_f64().sqrt();
    let mut r = match Decimal::from_f64_shortest(estimation) {
        Some(d) if !d.is_zero() => d,
        _ => x.div(&deux(), mc_sortie)?,
    };

    // carré parfait
    if r.mul_ctx(&r, mc_sortie)? == *x {
        return r.set_scale(p, mc.rounding);
    }

    let mut adaptatif = travail;
    let mut ecart = Decimal::zero();
    for i in 0..ITERATIONS_MAX {
        let dernier = r.clone();
        adaptatif = (adaptatif * 2).min(plafond);
        let mac = contexte(adaptatif, RoundingMode::HalfDown);

        r = x
            .div(&r, mac)?
            .add_ctx(&dernier, mac)?
            .div(&deux(), mac)?;

        ecart = r.sub(&dernier).abs();
        trace!("sqrt #{i} précision={adaptatif} écart={ecart}");
        if adaptatif >= plafond && ecart <= erreur_acceptable {
            return r.set_scale(p, mc.rounding);
        }
    }

    plafond_atteint("SQRT", &r, &ecart, p)?;
    r.set_scale(p, mc.rounding)
}

/* ------------------------ Racine n-ième ------------------------ */

/// x^(1/n) à `mc.precision` décimales.
///
/// n ≤ 1 : passe par la puissance x^(1/n). Sinon Newton depuis x/2 :
/// précision adaptative triplée à chaque tour (plafond 2p+6), arrêt quand
/// le pas ≤ 10^-(2p-1).
pub fn racine_nieme(x: &Decimal, n: &Decimal, mc: MathContext) -> Resultat<Decimal> {
    let p = precision_effective(mc);
    let travail = contexte(2 * p, RoundingMode::HalfUp);
    let plafond = 2 * p + 6;
    let erreur_acceptable = puissance_de_dix_negative(2 * p - 1)?;

    if x.is_zero() {
        return Ok(Decimal::zero());
    }
    if x.is_negative() {
        return Err(ArithmeticError::Domain(
            "First argument for ROOTN(X,Y) must not be negative".into(),
        ));
    }

    let un = Decimal::one();
    if *n <= un {
        let mac = contexte(plafond, RoundingMode::HalfUp);
        let inverse = un.div(&n.round(mac)?, mac)?;
        let r = puissance(&x.round(mac)?, &inverse, mac)?;
        return r.strip_trailing_zeros().set_scale(p, mc.rounding);
    }

    let n_moins_1 = n.sub(&un);
    let mut r = x.div(&deux(), travail)?;
    let mut adaptatif: i64 = 2;
    let mut dernier_pas = Decimal::zero();

    for i in 0..ITERATIONS_MAX {
        adaptatif = (adaptatif * 3).min(plafond);
        let mac = contexte(adaptatif, RoundingMode::HalfUp);

        let puiss = puissance(&r.round(mac)?, &n_moins_1.round(mac)?, mac)?;
        let pas = x.div(&puiss, mac)?.sub_ctx(&r, mac)?.div(n, mac)?;
        r = r.add_ctx(&pas, travail)?;

        trace!("rootn #{i} précision={adaptatif} pas={pas}");
        if pas.abs() <= erreur_acceptable {
            return r.set_scale(p, mc.rounding);
        }
        dernier_pas = pas;
    }

    plafond_atteint("ROOTN", &r, &dernier_pas, p)?;
    r.set_scale(p, mc.rounding)
}
