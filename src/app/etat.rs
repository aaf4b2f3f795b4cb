//! src/app/etat.rs
//!
//! État UI (sans vue, sans noyau).
//!
//! Rôle : contenir l'état de la calculatrice (entrée, liaisons, résultat,
//! erreur, précision, démarche) et offrir les opérations C/CLR/AC.
//!
//! Aucune évaluation ici ; la précision est bornée.

/// Précision par défaut, celle du contexte par défaut du noyau.
pub const DIGITS_DEFAUT: u32 = 7;

/// Garde-fou : au-delà, √ et racines n-ièmes deviennent lentes.
pub const DIGITS_MAX: u32 = 200;

#[derive(Clone, Default, Debug)]
pub struct Demarche {
    pub jetons: String,
    pub rpn: String,
    pub contexte: String,
    pub note: String,
}

#[derive(Clone, Debug)]
pub struct AppCalc {
    // --- entrées utilisateur ---
    pub entree: String,
    /// Liaisons `nom = valeur`, séparées par des `;`.
    pub liaisons: String,

    // --- sorties ---
    pub resultat: String,
    pub erreur: String,
    pub resultat_dispo: bool,

    pub demarche: Demarche,

    // --- paramètres ---
    /// Chiffres significatifs ; 0 = calcul exact.
    pub digits: u32,

    /// Redonne le focus à l'entrée après un clic sur un bouton.
    pub focus_entree: bool,
}

impl Default for AppCalc {
    fn default() -> Self {
        Self {
            entree: String::new(),
            liaisons: String::new(),
            resultat: String::new(),
            erreur: String::new(),
            resultat_dispo: false,
            demarche: Demarche::default(),
            digits: DIGITS_DEFAUT,
            focus_entree: true,
        }
    }
}

impl AppCalc {
    /* ------------------------ Actions "boutons" ------------------------ */

    /// AC : entrée, liaisons, résultats et précision par défaut.
    pub fn reset_total(&mut self) {
        self.entree.clear();
        self.liaisons.clear();
        self.clear_resultats();
        self.digits = DIGITS_DEFAUT;
        self.focus_entree = true;
    }

    /// C : efface seulement l'entrée.
    pub fn clear_entree(&mut self) {
        self.entree.clear();
        self.focus_entree = true;
    }

    /// CLR : résultat + erreur + démarche.
    pub fn clear_resultats(&mut self) {
        self.resultat.clear();
        self.erreur.clear();
        self.resultat_dispo = false;
        self.demarche = Demarche::default();
        self.focus_entree = true;
    }

    /// Dépose une erreur ; le dernier résultat est conservé à l'écran,
    /// la démarche (devenue fausse) est effacée.
    pub fn set_erreur(&mut self, msg: impl Into<String>) {
        self.erreur = msg.into();
        self.resultat_dispo = false;
        self.demarche = Demarche::default();
        self.focus_entree = true;
    }

    pub fn set_resultat(&mut self, resultat: impl Into<String>, demarche: Demarche) {
        self.erreur.clear();
        self.resultat = resultat.into();
        self.resultat_dispo = true;
        self.demarche = demarche;
        self.focus_entree = true;
    }

    pub fn set_digits(&mut self, digits: u32) {
        self.digits = digits.min(DIGITS_MAX);
        self.focus_entree = true;
    }

    /// Découpe `a = 2; b = a + 1` en couples (nom, texte).
    pub fn liaisons_lues(&self) -> Result<Vec<(String, String)>, String> {
        self.liaisons
            .split(';')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| match l.split_once('=') {
                Some((nom, valeur)) if !nom.trim().is_empty() => {
                    Ok((nom.trim().to_string(), valeur.trim().to_string()))
                }
                _ => Err(format!("Liaison invalide : '{l}' (attendu : nom = valeur)")),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bornes_et_remise_a_zero() {
        let mut app = AppCalc::default();
        app.set_digits(10_000);
        assert_eq!(app.digits, DIGITS_MAX);
        app.entree = "1+1".into();
        app.reset_total();
        assert!(app.entree.is_empty());
        assert_eq!(app.digits, DIGITS_DEFAUT);
    }

    #[test]
    fn lecture_des_liaisons() {
        let mut app = AppCalc::default();
        app.liaisons = " a = 2 ; b = a + 1;".into();
        assert_eq!(
            app.liaisons_lues().unwrap(),
            vec![("a".into(), "2".into()), ("b".into(), "a + 1".into())]
        );
        app.liaisons = "a 2".into();
        assert!(app.liaisons_lues().is_err());
    }
}
