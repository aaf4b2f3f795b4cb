// src/noyau/jetons.rs

use log::trace;
use std::collections::BTreeSet;
use std::fmt;

/// Nature d'un jeton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Variable,
    Function,
    Literal,
    HexLiteral,
    StringParam,
    Operator,
    UnaryOperator,
    OpenParen,
    CloseParen,
    Comma,
}

/// Unité lexicale : texte source, nature, position (0-based, en caractères).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub kind: TokenKind,
    pub pos: usize,
}

/// Suffixe des clés d'opérateurs unaires dans le registre.
pub const SUFFIXE_UNAIRE: &str = "u";

impl Token {
    pub fn new(surface: impl Into<String>, kind: TokenKind, pos: usize) -> Self {
        Self {
            surface: surface.into(),
            kind,
            pos,
        }
    }

    /// Clé de registre : `-` binaire reste `-`, `-` unaire devient `-u`.
    pub fn key(&self) -> String {
        match self.kind {
            TokenKind::UnaryOperator => format!("{}{SUFFIXE_UNAIRE}", self.surface),
            _ => self.surface.clone(),
        }
    }

    /// Produit une valeur quand il est juxtaposé (multiplication implicite).
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Literal | TokenKind::HexLiteral | TokenKind::Variable | TokenKind::CloseParen
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.surface)
    }
}

/* ------------------------ Tokenizer ------------------------ */

/// Découpe paresseuse d'une expression en jetons.
///
/// Le découpage des opérateurs est glouton : la plus longue suite de symboles
/// qui est un opérateur connu gagne (`<=` plutôt que `<` puis `=`).
/// Un opérateur est unaire s'il ouvre l'expression ou suit un opérateur
/// binaire, une parenthèse ouvrante ou une virgule.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    entree: Vec<char>,
    pos: usize,
    precedent: Option<TokenKind>,
    /// Motifs d'opérateurs connus (clés en majuscules, unaires suffixés).
    operateurs: BTreeSet<String>,
    first_var_chars: String,
    var_chars: String,
}

impl Tokenizer {
    pub fn new(expression: &str, operateurs: BTreeSet<String>) -> Self {
        Self {
            entree: expression.trim().chars().collect(),
            pos: 0,
            precedent: None,
            operateurs,
            first_var_chars: "_".to_string(),
            var_chars: "_".to_string(),
        }
    }

    /// Caractères (hors lettres) admis en tête puis dans la suite d'un nom.
    pub fn with_variable_characters(mut self, first: &str, rest: &str) -> Self {
        self.first_var_chars = first.to_string();
        self.var_chars = rest.to_string();
        self
    }

    fn courant(&self) -> Option<char> {
        self.entree.get(self.pos).copied()
    }

    fn suivant(&self) -> Option<char> {
        self.entree.get(self.pos + 1).copied()
    }

    fn connu(&self, motif: &str) -> bool {
        let cle = motif.to_uppercase();
        self.operateurs.contains(&cle)
            || self
                .operateurs
                .contains(&format!("{cle}{}", SUFFIXE_UNAIRE.to_uppercase()))
    }

    fn lire_nombre(&mut self) -> (String, TokenKind) {
        let hex = self.courant() == Some('0') && matches!(self.suivant(), Some('x' | 'X'));
        let mut surface = String::new();

        while let Some(c) = self.courant() {
            let apres_exposant = matches!(surface.chars().last(), Some('e' | 'E'));
            let accepte = (hex && (c.is_ascii_hexdigit() || c == 'x' || c == 'X'))
                || c.is_ascii_digit()
                || c == '.'
                || c == 'e'
                || c == 'E'
                || ((c == '-' || c == '+') && apres_exposant);
            if !accepte {
                break;
            }
            surface.push(c);
            self.pos += 1;
        }

        let kind = if hex {
            TokenKind::HexLiteral
        } else {
            TokenKind::Literal
        };
        (surface, kind)
    }

    fn lire_nom(&mut self) -> (String, TokenKind) {
        let mut surface = String::new();
        while let Some(c) = self.courant() {
            let accepte = c.is_alphabetic()
                || c.is_ascii_digit()
                || self.var_chars.contains(c)
                || (surface.is_empty() && self.first_var_chars.contains(c));
            if !accepte {
                break;
            }
            surface.push(c);
            self.pos += 1;
        }

        // blancs entre un nom et sa parenthèse
        while self.courant().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }

        let kind = if self.courant() == Some('(') {
            TokenKind::Function
        } else {
            TokenKind::Variable
        };
        (surface, kind)
    }

    fn lire_operateur(&mut self) -> (String, TokenKind) {
        let mut glouton = String::new();
        let mut meilleur: Option<(usize, String)> = None;

        while let Some(c) = self.courant() {
            if c.is_alphabetic()
                || c.is_ascii_digit()
                || self.first_var_chars.contains(c)
                || c.is_whitespace()
                || matches!(c, '(' | ')' | ',')
            {
                break;
            }
            glouton.push(c);
            self.pos += 1;
            if self.connu(&glouton) {
                meilleur = Some((self.pos, glouton.clone()));
            }
        }

        let surface = match meilleur {
            Some((fin, motif)) => {
                self.pos = fin;
                motif
            }
            None => glouton,
        };

        let unaire = matches!(
            self.precedent,
            None | Some(TokenKind::Operator | TokenKind::OpenParen | TokenKind::Comma)
        );
        let kind = if unaire {
            TokenKind::UnaryOperator
        } else {
            TokenKind::Operator
        };
        (surface, kind)
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.courant().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let ch = self.courant()?;
        let debut = self.pos;

        let (surface, kind) = if ch.is_ascii_digit()
            || (ch == '.' && self.suivant().is_some_and(|c| c.is_ascii_digit()))
        {
            self.lire_nombre()
        } else if ch == '"' {
            self.pos += 1;
            // guillemet fermant d'une chaîne : on repart du caractère suivant
            if self.precedent == Some(TokenKind::StringParam) {
                return self.next();
            }
            // le guillemet fermant n'est pas consommé ici
            let mut surface = String::new();
            while let Some(c) = self.courant() {
                if c == '"' {
                    break;
                }
                surface.push(c);
                self.pos += 1;
            }
            (surface, TokenKind::StringParam)
        } else if ch.is_alphabetic() || self.first_var_chars.contains(ch) {
            self.lire_nom()
        } else if matches!(ch, '(' | ')' | ',') {
            self.pos += 1;
            let kind = match ch {
                '(' => TokenKind::OpenParen,
                ')' => TokenKind::CloseParen,
                _ => TokenKind::Comma,
            };
            (ch.to_string(), kind)
        } else {
            self.lire_operateur()
        };

        let token = Token::new(surface, kind, debut);
        trace!("jeton {:?} '{}' @{}", token.kind, token.surface, token.pos);
        self.precedent = Some(kind);
        Some(token)
    }
}

/// Format utilitaire (debug/“démarche”) : liste de jetons en texte.
pub fn format_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match t.kind {
            TokenKind::StringParam => format!("\"{}\"", t.surface),
            TokenKind::UnaryOperator => t.key(),
            _ => t.surface.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
