// src/noyau/decimal.rs
//
// Décimal à précision arbitraire : valeur = unscaled × 10^(-scale).
// Aucune opération n'arrondit implicitement : seules les variantes `*_ctx`
// appliquent un MathContext (précision significative + mode d'arrondi).

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Float, One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::erreur::{ArithmeticError, ExpressionError};

/* ------------------------ Contexte ------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// Loin de zéro.
    Up,
    /// Vers zéro (troncature).
    Down,
    /// Vers +∞.
    Ceiling,
    /// Vers -∞.
    Floor,
    HalfUp,
    HalfDown,
    HalfEven,
}

/// Précision (chiffres significatifs, 0 = exact) + mode d'arrondi.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MathContext {
    pub precision: u32,
    pub rounding: RoundingMode,
}

impl MathContext {
    pub const DECIMAL32: MathContext = MathContext::new(7, RoundingMode::HalfEven);
    pub const DECIMAL64: MathContext = MathContext::new(16, RoundingMode::HalfEven);
    pub const DECIMAL128: MathContext = MathContext::new(34, RoundingMode::HalfEven);
    pub const UNLIMITED: MathContext = MathContext::new(0, RoundingMode::HalfUp);

    pub const fn new(precision: u32, rounding: RoundingMode) -> Self {
        Self {
            precision,
            rounding,
        }
    }

    /// Contexte HALF_UP à `precision` chiffres.
    pub const fn with_precision(precision: u32) -> Self {
        Self::new(precision, RoundingMode::HalfUp)
    }

    pub fn is_unlimited(&self) -> bool {
        self.precision == 0
    }
}

impl Default for MathContext {
    fn default() -> Self {
        Self::with_precision(7)
    }
}

/* ------------------------ Entiers : outils ------------------------ */

fn pow10(n: u32) -> BigInt {
    BigInt::from(10).pow(n)
}

/// 10^n pour un exposant calculé en i64 ou u64.
fn pow10_borne(n: impl TryInto<u32>) -> Result<BigInt, ArithmeticError> {
    n.try_into().map(pow10).map_err(|_| ArithmeticError::Overflow)
}

/// Échelle ramenée dans les bornes d'un i32 (comme `BigDecimal`) :
/// trop grande, la valeur est trop petite pour être représentée, et inversement.
fn echelle_bornee(scale: i64) -> Result<i32, ArithmeticError> {
    i32::try_from(scale).map_err(|_| {
        if scale > 0 {
            ArithmeticError::Underflow
        } else {
            ArithmeticError::Overflow
        }
    })
}

fn echelle_saturee(scale: i64) -> i32 {
    i32::try_from(scale).unwrap_or(if scale < 0 { i32::MIN } else { i32::MAX })
}

fn nb_chiffres(x: &BigInt) -> u64 {
    if x.is_zero() {
        1
    } else {
        x.magnitude().to_string().len() as u64
    }
}

fn est_impair(x: &BigInt) -> bool {
    !(x % BigInt::from(2)).is_zero()
}

/// Quotient arrondi de `num / den` selon `mode`.
///
/// `collant` signale des chiffres non nuls déjà écartés plus loin que `num`
/// (la vraie valeur est strictement au-delà de `num / den`, du même signe).
fn diviser_arrondi(num: &BigInt, den: &BigInt, mode: RoundingMode, collant: bool) -> BigInt {
    let q = num / den;
    let r = num % den;
    if r.is_zero() && !collant {
        return q;
    }

    let negatif = num.is_negative() != den.is_negative();
    let moitie = match (r.abs() * BigInt::from(2)).cmp(&den.abs()) {
        Ordering::Equal if collant => Ordering::Greater,
        o => o,
    };

    let incrementer = match mode {
        RoundingMode::Up => true,
        RoundingMode::Down => false,
        RoundingMode::Ceiling => !negatif,
        RoundingMode::Floor => negatif,
        RoundingMode::HalfUp => moitie != Ordering::Less,
        RoundingMode::HalfDown => moitie == Ordering::Greater,
        RoundingMode::HalfEven => {
            moitie == Ordering::Greater || (moitie == Ordering::Equal && est_impair(&q))
        }
    };

    match (incrementer, negatif) {
        (false, _) => q,
        (true, false) => q + BigInt::one(),
        (true, true) => q - BigInt::one(),
    }
}

/* ------------------------ Décimal ------------------------ */

#[derive(Clone, Debug)]
pub struct Decimal {
    unscaled: BigInt,
    scale: i32,
}

impl Decimal {
    pub fn new(unscaled: BigInt, scale: i32) -> Self {
        Self { unscaled, scale }
    }

    /// Comme `new`, pour une échelle issue d'un calcul.
    pub fn try_new(unscaled: BigInt, scale: i64) -> Result<Self, ArithmeticError> {
        Ok(Self::new(unscaled, echelle_bornee(scale)?))
    }

    pub fn zero() -> Self {
        Self::new(BigInt::zero(), 0)
    }

    pub fn one() -> Self {
        Self::new(BigInt::one(), 0)
    }

    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Exposant du chiffre de tête : 0 pour 1.5, 2 pour 123, -3 pour 0.00123.
    pub fn adjusted_exponent(&self) -> i64 {
        self.precision() as i64 - 1 - i64::from(self.scale)
    }

    /// Nombre de chiffres de la partie non mise à l'échelle (1 pour zéro).
    pub fn precision(&self) -> u64 {
        nb_chiffres(&self.unscaled)
    }

    pub fn signum(&self) -> i32 {
        if self.unscaled.is_zero() {
            0
        } else if self.unscaled.is_negative() {
            -1
        } else {
            1
        }
    }

    pub fn is_zero(&self) -> bool {
        self.unscaled.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.unscaled.is_negative()
    }

    pub fn abs(&self) -> Decimal {
        Decimal::new(self.unscaled.abs(), self.scale)
    }

    pub fn abs_ctx(&self, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        self.abs().round(mc)
    }

    /// Arrondit à `mc.precision` chiffres significatifs (no-op si illimité).
    pub fn round(&self, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        let p = u64::from(mc.precision);
        let d = self.precision();
        if p == 0 || d <= p {
            return Ok(self.clone());
        }

        let retrait = d - p;
        let q = diviser_arrondi(&self.unscaled, &pow10_borne(retrait)?, mc.rounding, false);
        let mut echelle = i64::from(self.scale) - retrait as i64;

        // 999.5 -> 1000 : un chiffre de trop, exactement divisible par 10
        let q = if nb_chiffres(&q) > p {
            echelle -= 1;
            q / BigInt::from(10)
        } else {
            q
        };
        Decimal::try_new(q, echelle)
    }

    /// Change l'échelle, en arrondissant si des chiffres disparaissent.
    pub fn set_scale(&self, scale: i64, mode: RoundingMode) -> Result<Decimal, ArithmeticError> {
        let scale = echelle_bornee(scale)?;
        let k = pow10(scale.abs_diff(self.scale));
        Ok(if scale >= self.scale {
            Decimal::new(&self.unscaled * k, scale)
        } else {
            Decimal::new(diviser_arrondi(&self.unscaled, &k, mode, false), scale)
        })
    }

    /// Retire les zéros de queue ; zéro devient `0` d'échelle 0.
    pub fn strip_trailing_zeros(&self) -> Decimal {
        if self.is_zero() {
            return Decimal::zero();
        }
        self.strip_jusqua(i32::MIN)
    }

    fn strip_jusqua(&self, echelle_min: i32) -> Decimal {
        let dix = BigInt::from(10);
        let mut u = self.unscaled.clone();
        let mut s = self.scale;
        while s > echelle_min && !u.is_zero() && (&u % &dix).is_zero() {
            u /= &dix;
            s -= 1;
        }
        Decimal::new(u, s)
    }

    /// Les deux valeurs ramenées à l'échelle commune max(sa, sb).
    /// L'écart entre deux échelles i32 tient toujours sur un u32.
    fn aligner(&self, other: &Decimal) -> (BigInt, BigInt, i32) {
        let s = self.scale.max(other.scale);
        let a = &self.unscaled * pow10(s.abs_diff(self.scale));
        let b = &other.unscaled * pow10(s.abs_diff(other.scale));
        (a, b, s)
    }

    /// Addition arrondie sans aligner un opérande négligeable : un terme dont
    /// le premier chiffre tombe au-delà du dernier chiffre utile du résultat
    /// est remplacé par une unité de même signe juste après ce chiffre, ce qui
    /// suffit à l'arrondi quel que soit le mode.
    fn add_arrondi(&self, other: &Decimal, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        if mc.is_unlimited() {
            return self.add(other).round(mc);
        }
        if self.is_zero() || other.is_zero() {
            return self.add_zero_arrondi(other, mc);
        }

        let (grand, petit) = if self.adjusted_exponent() >= other.adjusted_exponent() {
            (self, other)
        } else {
            (other, self)
        };
        let grand_echelle = i64::from(grand.scale);
        let echelle_resultat = grand_echelle - grand.precision() as i64 + i64::from(mc.precision);
        let tete_petit = i64::from(petit.scale) - petit.precision() as i64 + 1;

        if tete_petit > grand_echelle + 2 && tete_petit > echelle_resultat + 2 {
            let echelle = grand_echelle.max(echelle_resultat) + 3;
            let residu = Decimal::try_new(BigInt::from(petit.signum()), echelle)?;
            return grand.add(&residu).round(mc);
        }
        self.add(other).round(mc)
    }

    /* ---- Arithmétique exacte ---- */

    pub fn add(&self, other: &Decimal) -> Decimal {
        let (a, b, s) = self.aligner(other);
        Decimal::new(a + b, s)
    }

    pub fn sub(&self, other: &Decimal) -> Decimal {
        let (a, b, s) = self.aligner(other);
        Decimal::new(a - b, s)
    }

    /// Un des termes est nul : l'autre arrondi, ramené si possible à
    /// l'échelle préférée max(sa, sb).
    fn add_zero_arrondi(&self, other: &Decimal, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        let preferee = self.scale.max(other.scale);
        let non_nul = if self.is_zero() { other } else { self };
        if non_nul.is_zero() {
            return Ok(Decimal::new(BigInt::zero(), preferee));
        }

        let r = non_nul.round(mc)?;
        match r.scale.cmp(&preferee) {
            Ordering::Equal => Ok(r),
            Ordering::Greater => Ok(r.strip_jusqua(preferee)),
            Ordering::Less => {
                let marge = i64::from(mc.precision) - r.precision() as i64;
                let ecart = i64::from(preferee) - i64::from(r.scale);
                r.set_scale(i64::from(r.scale) + marge.min(ecart), mc.rounding)
            }
        }
    }

    pub fn mul(&self, other: &Decimal) -> Result<Decimal, ArithmeticError> {
        let echelle = i64::from(self.scale) + i64::from(other.scale);
        Decimal::try_new(&self.unscaled * &other.unscaled, echelle)
    }

    /* ---- Arithmétique sous contexte ---- */

    pub fn add_ctx(&self, other: &Decimal, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        self.add_arrondi(other, mc)
    }

    pub fn sub_ctx(&self, other: &Decimal, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        self.add_arrondi(&-other.clone(), mc)
    }

    pub fn mul_ctx(&self, other: &Decimal, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        self.mul(other)?.round(mc)
    }

    /// Division arrondie à `mc`. Un quotient exact garde l'échelle préférée
    /// `self.scale - other.scale` (zéros de queue retirés jusqu'à elle).
    pub fn div(&self, other: &Decimal, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        if other.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        let preferee = i64::from(self.scale) - i64::from(other.scale);
        if self.is_zero() {
            return Ok(Decimal::new(BigInt::zero(), echelle_saturee(preferee)));
        }
        if mc.is_unlimited() {
            return self.div_exacte(other);
        }

        // décalage choisi pour obtenir p+1 ou p+2 chiffres au quotient
        let p = i64::from(mc.precision);
        let decalage = p + other.precision() as i64 - self.precision() as i64 + 1;
        let (num, den) = if decalage >= 0 {
            (&self.unscaled * pow10_borne(decalage)?, other.unscaled.clone())
        } else {
            (self.unscaled.clone(), &other.unscaled * pow10_borne(-decalage)?)
        };

        let q = &num / &den;
        let reste_nul = (&num % &den).is_zero();

        let retrait = nb_chiffres(&q) as i64 - p;
        let diviseur = pow10_borne(retrait)?;
        let exact = reste_nul && (&q % &diviseur).is_zero();

        let mut q = diviser_arrondi(&q, &diviseur, mc.rounding, !reste_nul);
        let mut echelle = decalage + preferee - retrait;
        if nb_chiffres(&q) > p as u64 {
            q /= BigInt::from(10);
            echelle -= 1;
        }

        let res = Decimal::try_new(q, echelle)?;
        Ok(if exact {
            res.strip_jusqua(echelle_saturee(preferee))
        } else {
            res
        })
    }

    /// Division sans contexte : le quotient doit avoir un développement fini.
    fn div_exacte(&self, other: &Decimal) -> Result<Decimal, ArithmeticError> {
        let ratio = BigRational::new(self.unscaled.clone(), other.unscaled.clone());

        let mut den = ratio.denom().clone();
        let deux = BigInt::from(2);
        let cinq = BigInt::from(5);
        let (mut n2, mut n5) = (0u64, 0u64);
        while (&den % &deux).is_zero() {
            den /= &deux;
            n2 += 1;
        }
        while (&den % &cinq).is_zero() {
            den /= &cinq;
            n5 += 1;
        }
        if !den.is_one() {
            return Err(ArithmeticError::NonTerminating);
        }

        let k = n2.max(n5);
        let unscaled = ratio.numer() * pow10_borne(k)? / ratio.denom();
        let preferee = i64::from(self.scale) - i64::from(other.scale);
        let quotient = Decimal::try_new(unscaled, k as i64 + preferee)?;
        Ok(quotient.strip_jusqua(echelle_saturee(preferee)))
    }

    /// Reste tronqué (signe du dividende), arrondi à `mc`.
    ///
    /// Sous un contexte borné, un quotient entier de plus de `mc.precision`
    /// chiffres est refusé (`InvalidOperation`).
    pub fn rem(&self, other: &Decimal, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        if other.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        if self.abs() < other.abs() {
            return self.round(mc);
        }
        let chiffres_quotient = self.adjusted_exponent() - other.adjusted_exponent() + 1;
        if !mc.is_unlimited() && chiffres_quotient > i64::from(mc.precision) + 1 {
            return Err(ArithmeticError::InvalidOperation);
        }

        let (a, b, s) = self.aligner(other);
        if !mc.is_unlimited() && nb_chiffres(&(&a / &b)) > u64::from(mc.precision) {
            return Err(ArithmeticError::InvalidOperation);
        }
        Decimal::new(a % b, s).round(mc)
    }

    /// Puissance entière (carré-multiplication de gauche à droite) à
    /// précision de travail p + chiffres(n) + 1 ; n < 0 donne l'inverse.
    pub fn pow_int(&self, n: i64, mc: MathContext) -> Result<Decimal, ArithmeticError> {
        if mc.is_unlimited() {
            if n < 0 {
                return Err(ArithmeticError::InvalidOperation);
            }
            let n = u32::try_from(n).map_err(|_| ArithmeticError::InvalidOperation)?;
            let echelle = i64::from(self.scale)
                .checked_mul(i64::from(n))
                .ok_or(ArithmeticError::Underflow)?;
            let echelle = echelle_bornee(echelle)?;
            return Ok(Decimal::new(self.unscaled.pow(n), echelle));
        }
        if n == 0 {
            return Ok(Decimal::one());
        }

        let mag = n.unsigned_abs();
        let longueur = mag.to_string().len() as u32;
        if longueur > mc.precision {
            return Err(ArithmeticError::InvalidOperation);
        }
        let travail = MathContext::new(mc.precision + longueur + 1, mc.rounding);

        let mut acc = Decimal::one();
        let mut vu = false;
        for bit in (0..64).rev() {
            if vu {
                acc = acc.mul_ctx(&acc, travail)?;
            }
            if (mag >> bit) & 1 == 1 {
                vu = true;
                acc = acc.mul_ctx(self, travail)?;
            }
        }

        if n < 0 {
            acc = Decimal::one().div(&acc, travail)?;
        }
        acc.round(mc)
    }

    /* ---- Conversions ---- */

    /// Partie entière tronquée, si elle tient sur un i64.
    pub fn to_i64(&self) -> Option<i64> {
        if self.adjusted_exponent() > 18 {
            return None;
        }
        self.entier_tronque().to_i64()
    }

    /// Valeur entière exacte ; erreur si une fraction subsiste ou si hors i32.
    pub fn to_i32_exact(&self) -> Result<i32, ArithmeticError> {
        if self.adjusted_exponent() > 9 {
            return Err(ArithmeticError::Overflow);
        }
        let entier = self.entier_tronque();
        if Decimal::new(entier.clone(), 0) != *self {
            return Err(ArithmeticError::Domain("Rounding necessary".into()));
        }
        entier.to_i32().ok_or(ArithmeticError::Overflow)
    }

    fn entier_tronque(&self) -> BigInt {
        if self.adjusted_exponent() < 0 {
            BigInt::zero()
        } else if self.scale <= 0 {
            &self.unscaled * pow10(self.scale.unsigned_abs())
        } else {
            &self.unscaled / pow10(self.scale.unsigned_abs())
        }
    }

    pub fn to_f64(&self) -> f64 {
        // hors de portée d'un f64 : inutile de calculer la puissance de dix
        let exposant = self.adjusted_exponent();
        if exposant > 310 {
            return if self.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
        }
        if exposant < -400 {
            return if self.is_negative() { -0.0 } else { 0.0 };
        }

        let ratio = if self.scale <= 0 {
            BigRational::from_integer(self.entier_tronque())
        } else {
            BigRational::new(self.unscaled.clone(), pow10(self.scale.unsigned_abs()))
        };
        ratio.to_f64().unwrap_or(if self.is_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        })
    }

    /// Conversion exacte du binaire IEEE (0.1 -> 0.1000000000000000055511151231257827…).
    pub fn from_f64(f: f64) -> Option<Decimal> {
        if !f.is_finite() {
            return None;
        }
        let (mut mantisse, mut exposant, signe) = f.integer_decode();
        if mantisse == 0 {
            return Some(Decimal::zero());
        }
        while mantisse & 1 == 0 {
            mantisse >>= 1;
            exposant += 1;
        }

        let m = BigInt::from(mantisse) * BigInt::from(signe);
        Some(if exposant >= 0 {
            Decimal::new(m * BigInt::from(2).pow(exposant as u32), 0)
        } else {
            let k = -i32::from(exposant);
            Decimal::new(m * BigInt::from(5).pow(k.unsigned_abs()), k)
        })
    }

    /// Conversion par la plus courte écriture décimale (0.1 -> 0.1).
    pub fn from_f64_shortest(f: f64) -> Option<Decimal> {
        if !f.is_finite() {
            return None;
        }
        format!("{f:e}").parse().ok()
    }

    /// Écriture sans exposant.
    pub fn to_plain_string(&self) -> String {
        let neg = self.unscaled.is_negative();
        let chiffres = self.unscaled.magnitude().to_string();
        let signe = if neg { "-" } else { "" };

        if self.scale <= 0 {
            if self.is_zero() {
                return "0".to_string();
            }
            let zeros = "0".repeat(self.scale.unsigned_abs() as usize);
            return format!("{signe}{chiffres}{zeros}");
        }

        let scale = self.scale.unsigned_abs() as usize;
        if chiffres.len() > scale {
            let (ent, frac) = chiffres.split_at(chiffres.len() - scale);
            format!("{signe}{ent}.{frac}")
        } else {
            let zeros = "0".repeat(scale - chiffres.len());
            format!("{signe}0.{zeros}{chiffres}")
        }
    }
}

/* ------------------------ Traits ------------------------ */

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Decimal::new(BigInt::from(v), 0)
    }
}

impl From<i32> for Decimal {
    fn from(v: i32) -> Self {
        Decimal::new(BigInt::from(v), 0)
    }
}

impl From<u64> for Decimal {
    fn from(v: u64) -> Self {
        Decimal::new(BigInt::from(v), 0)
    }
}

impl From<BigInt> for Decimal {
    fn from(v: BigInt) -> Self {
        Decimal::new(v, 0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal::new(-self.unscaled, self.scale)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Signe, puis exposant du chiffre de tête ; l'alignement n'intervient
/// qu'à exposants égaux (écart d'échelles borné par les longueurs).
impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let signe = self.signum().cmp(&other.signum());
        if signe != Ordering::Equal || self.is_zero() {
            return signe;
        }
        let grandeur = self.adjusted_exponent().cmp(&other.adjusted_exponent());
        if grandeur != Ordering::Equal {
            return if self.is_negative() {
                grandeur.reverse()
            } else {
                grandeur
            };
        }
        let (a, b, _) = self.aligner(other);
        a.cmp(&b)
    }
}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let d = self.strip_trailing_zeros();
        d.unscaled.hash(state);
        d.scale.hash(state);
    }
}

/// Notation "scientifique" dès que l'échelle est négative ou que
/// l'exposant ajusté passe sous -6, sinon écriture simple.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chiffres = self.unscaled.magnitude().to_string();
        let ajuste = -i64::from(self.scale) + (chiffres.len() as i64 - 1);

        if self.scale >= 0 && ajuste >= -6 {
            return f.write_str(&self.to_plain_string());
        }

        if self.unscaled.is_negative() {
            f.write_str("-")?;
        }
        let (tete, reste) = chiffres.split_at(1);
        f.write_str(tete)?;
        if !reste.is_empty() {
            write!(f, ".{reste}")?;
        }
        if ajuste >= 0 {
            write!(f, "E+{ajuste}")
        } else {
            write!(f, "E{ajuste}")
        }
    }
}

/// Lecture d'un littéral : signe optionnel, chiffres avec au plus un point,
/// exposant optionnel `e`/`E` signé. L'échelle obtenue doit tenir sur un i32.
impl FromStr for Decimal {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalide = || ExpressionError::InvalidNumber(s.to_string());

        let (mantisse, exposant) = match s.find(['e', 'E']) {
            Some(i) => (&s[..i], Some(&s[i + 1..])),
            None => (s, None),
        };

        let (neg, corps) = match mantisse.as_bytes().first() {
            Some(b'-') => (true, &mantisse[1..]),
            Some(b'+') => (false, &mantisse[1..]),
            _ => (false, mantisse),
        };

        let (ent, frac) = match corps.split_once('.') {
            Some((e, f)) => (e, f),
            None => (corps, ""),
        };
        let que_des_chiffres = |t: &str| t.bytes().all(|b| b.is_ascii_digit());
        if ent.len() + frac.len() == 0 || !que_des_chiffres(ent) || !que_des_chiffres(frac) {
            return Err(invalide());
        }

        let mut scale = i64::try_from(frac.len()).map_err(|_| invalide())?;
        if let Some(e) = exposant {
            let sans_plus = e.strip_prefix('+').unwrap_or(e);
            let ex: i64 = sans_plus.parse().map_err(|_| invalide())?;
            scale = scale.checked_sub(ex).ok_or_else(invalide)?;
        }
        let scale = i32::try_from(scale).map_err(|_| invalide())?;

        let texte = format!("{ent}{frac}");
        let mut unscaled = BigInt::parse_bytes(texte.as_bytes(), 10).ok_or_else(invalide)?;
        if neg {
            unscaled = -unscaled;
        }
        Ok(Decimal::new(unscaled, scale))
    }
}
