// src/noyau/expression.rs
//
// Façade : texte source, tables (opérateurs, fonctions, variables),
// contexte de calcul et RPN mise en cache.
//
// La RPN est calculée au premier besoin puis conservée ; seule la liaison
// d'une variable à un texte non numérique (nouvelle sous-expression)
// l'invalide.

use log::debug;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::decimal::{Decimal, MathContext, RoundingMode};
use super::erreur::Result;
use super::eval::evaluate;
use super::jetons::{Token, TokenKind, Tokenizer};
use super::paresseux::LazyValue;
use super::registre::{Contexte, Function, Operator, Registre};
use super::rpn::{format_rpn, to_rpn, validate};
use super::standard;

/// Variables prédéfinies que `used_variables` ne rapporte pas.
const VARIABLES_IMPLICITES: [&str; 4] = ["PI", "e", "TRUE", "FALSE"];

/// Valeur acceptée par `set_variable`.
#[derive(Clone, Debug)]
pub enum VariableValue {
    Decimal(Decimal),
    Lazy(LazyValue),
    /// Nombre, `null`, ou texte d'une sous-expression.
    Text(String),
    Null,
}

impl From<Decimal> for VariableValue {
    fn from(d: Decimal) -> Self {
        VariableValue::Decimal(d)
    }
}

impl From<Option<Decimal>> for VariableValue {
    fn from(d: Option<Decimal>) -> Self {
        d.map_or(VariableValue::Null, VariableValue::Decimal)
    }
}

impl From<LazyValue> for VariableValue {
    fn from(v: LazyValue) -> Self {
        VariableValue::Lazy(v)
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Text(s.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        VariableValue::Text(s)
    }
}

/// Texte lisible comme un nombre : chiffres, signes, point, exposant ;
/// un signe seul, un point sans chiffre derrière ou un `e` en tête sont refusés.
fn ressemble_a_un_nombre(s: &str) -> bool {
    let mut car = s.chars();
    match (car.next(), car.next()) {
        (None, _) | (Some('-' | '+' | '.'), None) | (Some('e' | 'E'), _) => false,
        (Some('.'), Some(c)) if !c.is_ascii_digit() => false,
        _ => s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')),
    }
}

pub struct Expression {
    original: String,
    expression: String,
    rpn: RefCell<Option<Rc<Vec<Token>>>>,
    registre: Registre,
    contexte: Contexte,
    first_var_chars: String,
    var_chars: String,
}

impl Expression {
    /// Expression au contexte par défaut (7 chiffres, HALF_UP).
    pub fn new(expression: &str) -> Self {
        Self::with_context(expression, MathContext::default())
    }

    pub fn with_context(expression: &str, mc: MathContext) -> Self {
        let e = Self::sur_tables(expression, Registre::new(), mc);
        standard::installer(&e.registre, &e.contexte);
        e
    }

    /// Expression qui résout ses noms dans des tables existantes
    /// (celles de l'expression parente), sans réinstaller le jeu standard.
    pub(crate) fn nested(expression: &str, registre: Registre, mc: MathContext) -> Self {
        Self::sur_tables(expression, registre, mc)
    }

    fn sur_tables(expression: &str, registre: Registre, mc: MathContext) -> Self {
        Self {
            original: expression.to_string(),
            expression: expression.to_string(),
            rpn: RefCell::new(None),
            registre,
            contexte: Rc::new(Cell::new(mc)),
            first_var_chars: "_".to_string(),
            var_chars: "_".to_string(),
        }
    }

    /* ---- Évaluation ---- */

    /// Évalue, zéros de queue retirés. `None` = pas de valeur.
    pub fn eval(&self) -> Result<Option<Decimal>> {
        self.eval_with(true)
    }

    pub fn eval_with(&self, strip_trailing_zeros: bool) -> Result<Option<Decimal>> {
        let rpn = self.rpn()?;
        let resultat = evaluate(&rpn, &self.registre, &self.contexte)?.force()?;
        Ok(resultat.map(|d| {
            if strip_trailing_zeros {
                d.strip_trailing_zeros()
            } else {
                d
            }
        }))
    }

    fn rpn(&self) -> Result<Rc<Vec<Token>>> {
        if let Some(rpn) = self.rpn.borrow().clone() {
            return Ok(rpn);
        }
        let rpn = to_rpn(self.tokenizer(), &self.registre)?;
        validate(&rpn, &self.registre)?;
        debug!("RPN de '{}' : {}", self.expression, format_rpn(&rpn));

        let rpn = Rc::new(rpn);
        *self.rpn.borrow_mut() = Some(Rc::clone(&rpn));
        Ok(rpn)
    }

    /// RPN en texte ; une variable liée à une sous-expression est remplacée
    /// par la RPN de celle-ci (récursivement).
    pub fn to_rpn(&self) -> Result<String> {
        let rpn = self.rpn()?;
        let mut morceaux = Vec::with_capacity(rpn.len());
        for t in rpn.iter() {
            let imbriquee = match t.kind {
                TokenKind::Variable => self
                    .registre
                    .variable(&t.surface)
                    .and_then(|v| v.sub_expression().map(str::to_string)),
                _ => None,
            };
            match imbriquee {
                Some(texte) => {
                    let e = Expression::nested(&texte, self.registre.clone(), self.contexte.get());
                    morceaux.push(e.to_rpn()?);
                }
                None => morceaux.push(format_rpn(std::slice::from_ref(t))),
            }
        }
        Ok(morceaux.join(" "))
    }

    /* ---- Configuration ---- */

    /// Change la précision en gardant le mode d'arrondi.
    pub fn set_precision(&mut self, precision: u32) -> &mut Self {
        let mc = self.contexte.get();
        self.contexte.set(MathContext::new(precision, mc.rounding));
        self
    }

    pub fn set_rounding_mode(&mut self, rounding: RoundingMode) -> &mut Self {
        let mc = self.contexte.get();
        self.contexte.set(MathContext::new(mc.precision, rounding));
        self
    }

    pub fn set_math_context(&mut self, mc: MathContext) -> &mut Self {
        self.contexte.set(mc);
        self
    }

    pub fn math_context(&self) -> MathContext {
        self.contexte.get()
    }

    /// Caractères (hors lettres) admis en tête d'un nom de variable.
    pub fn set_first_variable_characters(&mut self, chars: &str) -> &mut Self {
        self.first_var_chars = chars.to_string();
        self
    }

    /// Caractères (hors lettres et chiffres) admis dans la suite d'un nom.
    pub fn set_variable_characters(&mut self, chars: &str) -> &mut Self {
        self.var_chars = chars.to_string();
        self
    }

    /* ---- Variables ---- */

    /// Lie `name`. Un texte numérique devient un littéral, `null` l'absence
    /// de valeur, tout autre texte une sous-expression évaluée dans les
    /// mêmes tables (et la RPN en cache est alors invalidée).
    pub fn set_variable(&mut self, name: &str, value: impl Into<VariableValue>) -> &mut Self {
        let valeur = match value.into() {
            VariableValue::Decimal(d) => LazyValue::from(d),
            VariableValue::Lazy(v) => v,
            VariableValue::Null => LazyValue::null(),
            VariableValue::Text(t) if ressemble_a_un_nombre(&t) => LazyValue::Literal {
                text: t,
                contexte: self.contexte.clone(),
            },
            VariableValue::Text(t) if t.eq_ignore_ascii_case("null") => LazyValue::null(),
            VariableValue::Text(t) => {
                debug!("'{name}' liée à la sous-expression '{t}', RPN invalidée");
                *self.rpn.get_mut() = None;
                LazyValue::SubExpression {
                    text: t,
                    registre: self.registre.downgrade(),
                    mc: self.contexte.get(),
                }
            }
        };
        self.registre.set_variable(name, valeur);
        self
    }

    pub fn where_decimal(&mut self, name: &str, value: Decimal) -> &mut Self {
        self.set_variable(name, value)
    }

    pub fn where_str(&mut self, name: &str, value: &str) -> &mut Self {
        self.set_variable(name, value)
    }

    pub fn where_lazy(&mut self, name: &str, value: LazyValue) -> &mut Self {
        self.set_variable(name, value)
    }

    /// Lie une liste sous forme de texte `a, b, c`, lisible par SUM, MEAN,
    /// VARIANCE et STDDEV.
    pub fn where_list(&mut self, name: &str, values: &[Decimal]) -> &mut Self {
        let texte = values
            .iter()
            .map(Decimal::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.set_variable(name, texte)
    }

    /* ---- Registre ---- */

    /// Rend l'opérateur qui occupait la même clé, s'il y en avait un.
    pub fn add_operator(&mut self, operator: Operator) -> Option<Rc<Operator>> {
        self.registre.add_operator(operator)
    }

    pub fn add_function(&mut self, function: Function) -> Option<Rc<Function>> {
        self.registre.add_function(function)
    }

    pub fn declared_variables(&self) -> Vec<String> {
        self.registre.variables.borrow().names()
    }

    pub fn declared_operators(&self) -> Vec<String> {
        self.registre.operateurs.borrow().names()
    }

    pub fn declared_functions(&self) -> Vec<String> {
        self.registre.fonctions.borrow().names()
    }

    /* ---- Requêtes ---- */

    pub fn original_expression(&self) -> &str {
        &self.original
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Découpe du texte courant, indépendante de la RPN en cache.
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(&self.expression, self.registre.operator_keys())
            .with_variable_characters(&self.first_var_chars, &self.var_chars)
    }

    /// Noms de variables du texte, hors PI, e, TRUE et FALSE.
    pub fn used_variables(&self) -> Vec<String> {
        self.tokenizer()
            .filter(|t| t.kind == TokenKind::Variable)
            .map(|t| t.surface)
            .filter(|s| !VARIABLES_IMPLICITES.contains(&s.as_str()))
            .collect()
    }

    /// Le résultat est-il booléen ? Décidé par le dernier opérateur ou la
    /// dernière fonction de la RPN ; IF est sauté (ses branches décident).
    pub fn is_boolean(&self) -> Result<bool> {
        let rpn = self.rpn()?;
        for t in rpn.iter().rev() {
            match t.kind {
                TokenKind::Function if t.surface.eq_ignore_ascii_case("IF") => continue,
                TokenKind::Function => {
                    return Ok(self
                        .registre
                        .function(&t.surface)
                        .is_some_and(|f| f.is_boolean()))
                }
                TokenKind::Operator => {
                    return Ok(self
                        .registre
                        .operator(&t.surface)
                        .is_some_and(|o| o.is_boolean()))
                }
                _ => {}
            }
        }
        Ok(false)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("expression", &self.expression)
            .field("math_context", &self.contexte.get())
            .field("rpn_en_cache", &self.rpn.borrow().is_some())
            .finish()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expression.hash(state);
    }
}
