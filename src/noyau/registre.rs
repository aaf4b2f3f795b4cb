// src/noyau/registre.rs
//
// Tables insensibles à la casse (opérateurs, fonctions, variables) partagées
// par poignées `Rc` : une sous-expression imbriquée voit les mêmes tables
// que l'expression qui l'a créée.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};

use super::decimal::{Decimal, MathContext};
use super::erreur::{ArithmeticError, ExpressionError, Result};
use super::jetons::SUFFIXE_UNAIRE;
use super::paresseux::LazyValue;

/* ------------------------ Table insensible à la casse ------------------------ */

/// Dictionnaire dont les clés sont comparées sans la casse ;
/// le nom tel qu'enregistré est conservé pour l'affichage.
#[derive(Clone)]
pub struct Table<V> {
    entrees: BTreeMap<String, (String, V)>,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            entrees: BTreeMap::new(),
        }
    }
}

impl<V: Clone> Table<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn cle(nom: &str) -> String {
        nom.to_uppercase()
    }

    /// Insère et rend l'ancienne valeur de la clé, s'il y en avait une.
    pub fn insert(&mut self, nom: &str, valeur: V) -> Option<V> {
        self.entrees
            .insert(Self::cle(nom), (nom.to_string(), valeur))
            .map(|(_, v)| v)
    }

    pub fn get(&self, nom: &str) -> Option<V> {
        self.entrees.get(&Self::cle(nom)).map(|(_, v)| v.clone())
    }

    pub fn contains(&self, nom: &str) -> bool {
        self.entrees.contains_key(&Self::cle(nom))
    }

    pub fn remove(&mut self, nom: &str) -> Option<V> {
        self.entrees.remove(&Self::cle(nom)).map(|(_, v)| v)
    }

    /// Noms tels qu'enregistrés, dans l'ordre des clés.
    pub fn names(&self) -> Vec<String> {
        self.entrees.values().map(|(n, _)| n.clone()).collect()
    }

    /// Clés normalisées (majuscules).
    pub fn keys(&self) -> BTreeSet<String> {
        self.entrees.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrees.is_empty()
    }
}

/* ------------------------ Opérateurs ------------------------ */

pub type ApplicationBinaire = dyn Fn(&LazyValue, &LazyValue) -> Result<Option<Decimal>>;
pub type ApplicationUnaire = dyn Fn(&LazyValue) -> Result<Option<Decimal>>;

#[derive(Clone)]
pub enum Application {
    Binaire(Rc<ApplicationBinaire>),
    Unaire(Rc<ApplicationUnaire>),
}

/// Définition d'opérateur. Les opérandes arrivent non forcés :
/// l'opérateur décide quand (et s'il faut) les évaluer.
#[derive(Clone)]
pub struct Operator {
    pattern: String,
    precedence: i32,
    left_assoc: bool,
    boolean: bool,
    application: Application,
}

impl Operator {
    /// Opérateur binaire à opérandes paresseux (court-circuit possible).
    pub fn lazy_binary(
        pattern: &str,
        precedence: i32,
        left_assoc: bool,
        boolean: bool,
        f: impl Fn(&LazyValue, &LazyValue) -> Result<Option<Decimal>> + 'static,
    ) -> Self {
        Self {
            pattern: pattern.to_string(),
            precedence,
            left_assoc,
            boolean,
            application: Application::Binaire(Rc::new(f)),
        }
    }

    /// Opérateur binaire qui accepte des opérandes absents (`null`).
    pub fn nullable_binary(
        pattern: &str,
        precedence: i32,
        left_assoc: bool,
        boolean: bool,
        f: impl Fn(Option<Decimal>, Option<Decimal>) -> Result<Option<Decimal>> + 'static,
    ) -> Self {
        Self::lazy_binary(pattern, precedence, left_assoc, boolean, move |a, b| {
            f(a.force()?, b.force()?)
        })
    }

    /// Opérateur binaire arithmétique : les deux opérandes doivent exister.
    pub fn binary(
        pattern: &str,
        precedence: i32,
        left_assoc: bool,
        boolean: bool,
        f: impl Fn(Decimal, Decimal) -> Result<Decimal> + 'static,
    ) -> Self {
        Self::nullable_binary(pattern, precedence, left_assoc, boolean, move |a, b| {
            let a = a.ok_or(ArithmeticError::NullFirstOperand)?;
            let b = b.ok_or(ArithmeticError::NullSecondOperand)?;
            f(a, b).map(Some)
        })
    }

    /// Opérateur unaire (rangé sous `pattern + "u"`).
    pub fn unary(
        pattern: &str,
        precedence: i32,
        left_assoc: bool,
        f: impl Fn(Decimal) -> Result<Decimal> + 'static,
    ) -> Self {
        let application = move |v: &LazyValue| -> Result<Option<Decimal>> {
            let v = v.force()?.ok_or(ArithmeticError::NullOperand)?;
            f(v).map(Some)
        };
        Self {
            pattern: pattern.to_string(),
            precedence,
            left_assoc,
            boolean: false,
            application: Application::Unaire(Rc::new(application)),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn precedence(&self) -> i32 {
        self.precedence
    }

    pub fn is_left_assoc(&self) -> bool {
        self.left_assoc
    }

    pub fn is_boolean(&self) -> bool {
        self.boolean
    }

    pub fn is_unary(&self) -> bool {
        matches!(self.application, Application::Unaire(_))
    }

    /// Clé de registre : le motif, suffixé pour un unaire.
    pub fn key(&self) -> String {
        if self.is_unary() {
            format!("{}{SUFFIXE_UNAIRE}", self.pattern)
        } else {
            self.pattern.clone()
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("key", &self.key())
            .field("precedence", &self.precedence)
            .field("left_assoc", &self.left_assoc)
            .field("boolean", &self.boolean)
            .finish()
    }
}

/* ------------------------ Fonctions ------------------------ */

/// Nombre de paramètres d'une fonction variadique.
pub const VARIADIQUE: i32 = -1;

pub type ApplicationFonction = dyn Fn(&[LazyValue]) -> Result<LazyValue>;

/// Définition de fonction : paramètres non forcés, résultat différé.
#[derive(Clone)]
pub struct Function {
    name: String,
    num_params: i32,
    boolean: bool,
    application: Rc<ApplicationFonction>,
}

impl Function {
    /// Fonction paresseuse : reçoit les paramètres tels quels.
    pub fn lazy(
        name: &str,
        num_params: i32,
        boolean: bool,
        f: impl Fn(&[LazyValue]) -> Result<LazyValue> + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            num_params,
            boolean,
            application: Rc::new(f),
        }
    }

    /// Fonction stricte : tous les paramètres sont forcés avant l'appel.
    pub fn new(
        name: &str,
        num_params: i32,
        boolean: bool,
        f: impl Fn(&[Option<Decimal>]) -> Result<Option<Decimal>> + 'static,
    ) -> Self {
        Self::lazy(name, num_params, boolean, move |params| {
            let valeurs = params
                .iter()
                .map(LazyValue::force)
                .collect::<Result<Vec<_>>>()?;
            Ok(LazyValue::Constant(f(&valeurs)?))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_params(&self) -> i32 {
        self.num_params
    }

    pub fn is_variadic(&self) -> bool {
        self.num_params == VARIADIQUE
    }

    pub fn is_boolean(&self) -> bool {
        self.boolean
    }

    pub fn apply(&self, params: &[LazyValue]) -> Result<LazyValue> {
        (self.application)(params)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("num_params", &self.num_params)
            .field("boolean", &self.boolean)
            .finish()
    }
}

/* ------------------------ Poignées partagées ------------------------ */

pub type Contexte = Rc<Cell<MathContext>>;
pub type Operateurs = Rc<RefCell<Table<Rc<Operator>>>>;
pub type Fonctions = Rc<RefCell<Table<Rc<Function>>>>;
pub type Variables = Rc<RefCell<Table<LazyValue>>>;

/// Ensemble des tables d'une expression. Cloner la poignée partage les tables.
#[derive(Clone, Default)]
pub struct Registre {
    pub operateurs: Operateurs,
    pub fonctions: Fonctions,
    pub variables: Variables,
}

impl Registre {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operator(&self, op: Operator) -> Option<Rc<Operator>> {
        let cle = op.key();
        self.operateurs.borrow_mut().insert(&cle, Rc::new(op))
    }

    pub fn add_function(&self, f: Function) -> Option<Rc<Function>> {
        let nom = f.name().to_string();
        self.fonctions.borrow_mut().insert(&nom, Rc::new(f))
    }

    pub fn operator(&self, cle: &str) -> Option<Rc<Operator>> {
        self.operateurs.borrow().get(cle)
    }

    pub fn function(&self, nom: &str) -> Option<Rc<Function>> {
        self.fonctions.borrow().get(nom)
    }

    /// Valeur liée (clonée : aucun emprunt ne survit à l'appel).
    pub fn variable(&self, nom: &str) -> Option<LazyValue> {
        self.variables.borrow().get(nom)
    }

    pub fn set_variable(&self, nom: &str, valeur: LazyValue) -> Option<LazyValue> {
        self.variables.borrow_mut().insert(nom, valeur)
    }

    pub fn has_variable(&self, nom: &str) -> bool {
        self.variables.borrow().contains(nom)
    }

    /// Clés des opérateurs connus, pour le découpage glouton.
    pub fn operator_keys(&self) -> BTreeSet<String> {
        self.operateurs.borrow().keys()
    }

    /// Poignée faible, pour les valeurs rangées dans les tables elles-mêmes
    /// (sous-expressions, fonctions du catalogue) : pas de cycle `Rc`.
    pub fn downgrade(&self) -> RegistreFaible {
        RegistreFaible {
            operateurs: Rc::downgrade(&self.operateurs),
            fonctions: Rc::downgrade(&self.fonctions),
            variables: Rc::downgrade(&self.variables),
        }
    }
}

#[derive(Clone, Default)]
pub struct RegistreFaible {
    operateurs: Weak<RefCell<Table<Rc<Operator>>>>,
    fonctions: Weak<RefCell<Table<Rc<Function>>>>,
    variables: Weak<RefCell<Table<LazyValue>>>,
}

impl RegistreFaible {
    pub fn upgrade(&self) -> Result<Registre> {
        let tables = self
            .operateurs
            .upgrade()
            .zip(self.fonctions.upgrade())
            .zip(self.variables.upgrade());
        match tables {
            Some(((operateurs, fonctions), variables)) => Ok(Registre {
                operateurs,
                fonctions,
                variables,
            }),
            None => Err(ExpressionError::DetachedTables.into()),
        }
    }
}
