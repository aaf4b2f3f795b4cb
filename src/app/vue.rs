// src/app/vue.rs
//
// Vue (UI egui)
// -------------
// - Enter évalue, Backspace efface (quand le champ a le focus)
// - Gros boutons, focus redonné après clic (focus_entree)
// - Champ de liaisons `x = 2; y = x + 1` (sous-expressions permises)

use eframe::egui;

use super::etat::{AppCalc, Demarche, DIGITS_MAX};

/// Motifs retirés d'un coup par Backspace.
const MOTIFS_EFFACES: [&str; 9] = [
    "sqrt(", "rootn(", "sin(", "cos(", "tan(", "max(", "min(", "if(", "PI",
];

impl AppCalc {
    /// UI principale : appelée depuis eframe::App::update(...)
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Calculatrice d'expressions");
                ui.add_space(6.0);

                self.ui_entree(ui);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_resultat(ui);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_demarche(ui);
            });
    }

    fn ui_entree(&mut self, ui: &mut egui::Ui) {
        ui.label("Entrée :");

        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.entree)
                .desired_width(ui.available_width())
                .hint_text("Ex: 3(x + 2), sqrt(2)^2, IF(x > 0, 1, -1), max(1, 2) > 1 && NOT(0)")
                .id_source("entree_edit")
                .code_editor(),
        );

        if self.focus_entree {
            resp.request_focus();
            self.focus_entree = false;
        }

        let enter = ui.input(|i| i.key_pressed(egui::Key::Enter));
        if resp.has_focus() && enter {
            self.eval_via_noyau();
        }

        // TextEdit gère déjà Backspace ; ici on retire les motifs complets
        let backspace = ui.input(|i| i.key_pressed(egui::Key::Backspace));
        if resp.has_focus() && backspace {
            self.backspace_entree();
            self.focus_entree = true;
        }

        ui.add_space(4.0);
        ui.label("Variables :");
        ui.add(
            egui::TextEdit::singleline(&mut self.liaisons)
                .desired_width(ui.available_width())
                .hint_text("x = 2; y = x + 1")
                .id_source("liaisons_edit")
                .code_editor(),
        );

        ui.add_space(6.0);

        ui.horizontal(|ui| {
            // C = entrée seulement ; CLR = résultats seulement ; AC = tout
            self.bouton_action(ui, "C", "Efface seulement l'entrée", Action::ClearEntree);
            self.bouton_action(
                ui,
                "CLR",
                "Efface résultat + erreur + démarche",
                Action::ClearResultats,
            );
            self.bouton_action(ui, "AC", "Remise à zéro totale", Action::ResetTotal);

            ui.separator();

            ui.label("Précision :");
            let mut d = self.digits;
            let resp = ui
                .add(
                    egui::DragValue::new(&mut d)
                        .speed(1)
                        .range(0..=DIGITS_MAX)
                        .suffix(" chiffres"),
                )
                .on_hover_text("0 = calcul exact (une division infinie échoue)");
            if resp.changed() {
                self.set_digits(d);
            }
        });

        ui.add_space(8.0);

        ui.horizontal_wrapped(|ui| {
            self.bouton_insert(ui, "(", "(", InsertKind::OpenParen);
            self.bouton_insert(ui, ")", ")", InsertKind::CloseParen);
            self.bouton_insert(ui, ",", ",", InsertKind::Comma);

            for op in ["+", "-", "*", "/", "%", "^", ">", "<", "=", "&&", "||"] {
                self.bouton_insert(ui, op, op, InsertKind::Op);
            }

            ui.separator();

            self.bouton_insert(ui, "PI", "PI", InsertKind::Word);
            self.bouton_insert(ui, "e", "e", InsertKind::Word);
            for (label, f) in [
                ("sqrt", "sqrt("),
                ("rootn", "rootn("),
                ("sin", "sin("),
                ("cos", "cos("),
                ("tan", "tan("),
                ("max", "max("),
                ("min", "min("),
                ("if", "if("),
            ] {
                self.bouton_insert(ui, label, f, InsertKind::Func);
            }

            ui.separator();

            self.bouton_insert(ui, "x", "x", InsertKind::Word);
            self.bouton_insert(ui, "y", "y", InsertKind::Word);

            ui.add_space(10.0);

            let eq = ui.add_sized([64.0, 32.0], egui::Button::new("="));
            if eq.clicked() {
                self.eval_via_noyau();
            }
        });

        ui.add_space(8.0);

        self.ui_pave_numerique(ui);

        if !self.erreur.is_empty() {
            ui.add_space(6.0);
            ui.colored_label(ui.visuals().error_fg_color, &self.erreur);
        }
    }

    fn ui_pave_numerique(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("pave_numerique")
            .num_columns(4)
            .spacing([6.0, 6.0])
            .show(ui, |ui| {
                self.bouton_insert(ui, "7", "7", InsertKind::Digit);
                self.bouton_insert(ui, "8", "8", InsertKind::Digit);
                self.bouton_insert(ui, "9", "9", InsertKind::Digit);
                self.bouton_action(ui, "DEL", "Efface le dernier symbole", Action::Backspace);
                ui.end_row();

                self.bouton_insert(ui, "4", "4", InsertKind::Digit);
                self.bouton_insert(ui, "5", "5", InsertKind::Digit);
                self.bouton_insert(ui, "6", "6", InsertKind::Digit);
                self.bouton_insert(ui, "0x", "0x", InsertKind::Digit);
                ui.end_row();

                self.bouton_insert(ui, "1", "1", InsertKind::Digit);
                self.bouton_insert(ui, "2", "2", InsertKind::Digit);
                self.bouton_insert(ui, "3", "3", InsertKind::Digit);
                self.bouton_insert(ui, ".", ".", InsertKind::Digit);
                ui.end_row();

                self.bouton_insert(ui, "0", "0", InsertKind::Digit);
                self.bouton_insert(ui, "E", "E", InsertKind::Digit);
                ui.label("");
                ui.label("");
                ui.end_row();
            });
    }

    fn backspace_entree(&mut self) {
        if self.entree.is_empty() {
            return;
        }
        self.retirer_espaces_finaux();

        let majuscules = self.entree.to_uppercase();
        let motif = MOTIFS_EFFACES
            .iter()
            .find(|m| majuscules.ends_with(&m.to_uppercase()));
        let n = motif.map_or(1, |m| m.chars().count());
        for _ in 0..n {
            self.entree.pop();
        }
        self.retirer_espaces_finaux();
    }

    fn retirer_espaces_finaux(&mut self) {
        while self.entree.ends_with(' ') {
            self.entree.pop();
        }
    }

    fn ui_resultat(&mut self, ui: &mut egui::Ui) {
        ui.label("Résultat :");
        if self.resultat_dispo {
            Self::champ_monospace(ui, "resultat_out", &self.resultat, 2);
        } else {
            ui.monospace("indisponible");
        }
    }

    fn ui_demarche(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Démarche")
            .default_open(true)
            .show(ui, |ui| {
                Self::champ_demarche(ui, "Jetons", "demarche_jetons", &self.demarche.jetons);
                Self::champ_demarche(ui, "RPN", "demarche_rpn", &self.demarche.rpn);
                Self::champ_demarche(ui, "Contexte", "demarche_contexte", &self.demarche.contexte);
                Self::champ_demarche(ui, "Note", "demarche_note", &self.demarche.note);
            });
    }

    fn champ_demarche(ui: &mut egui::Ui, titre: &str, id: &str, contenu: &str) {
        ui.add_space(4.0);
        ui.label(format!("{titre} :"));
        Self::champ_monospace(ui, id, contenu, 2);
    }

    fn champ_monospace(ui: &mut egui::Ui, id: &str, contenu: &str, rows: usize) {
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.push_id(id, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.set_min_height(
                        rows as f32 * ui.text_style_height(&egui::TextStyle::Monospace),
                    );
                    ui.monospace(contenu);
                });
            });
    }

    fn bouton_action(&mut self, ui: &mut egui::Ui, label: &str, tip: &str, action: Action) {
        let resp = ui
            .add_sized([56.0, 30.0], egui::Button::new(label))
            .on_hover_text(tip);

        if resp.clicked() {
            match action {
                Action::ClearEntree => self.clear_entree(),
                Action::ClearResultats => self.clear_resultats(),
                Action::ResetTotal => self.reset_total(),
                Action::Backspace => self.backspace_entree(),
            }
            self.focus_entree = true;
        }
    }

    fn bouton_insert(&mut self, ui: &mut egui::Ui, label: &str, to_insert: &str, kind: InsertKind) {
        let resp = ui.add_sized([46.0, 28.0], egui::Button::new(label));
        if !resp.clicked() || to_insert.is_empty() {
            return;
        }

        match kind {
            InsertKind::CloseParen | InsertKind::Comma => {
                self.retirer_espaces_finaux();
                self.entree.push_str(to_insert);
                if kind == InsertKind::Comma {
                    self.entree.push(' ');
                }
            }
            InsertKind::OpenParen | InsertKind::Func => {
                let last = self.entree.chars().rev().find(|c| !c.is_whitespace());
                if let Some(c) = last {
                    if c.is_ascii_alphanumeric() || c == ')' {
                        self.entree.push(' ');
                    }
                }
                self.entree.push_str(to_insert);
            }
            InsertKind::Op => {
                self.retirer_espaces_finaux();
                if !self.entree.is_empty() {
                    self.entree.push(' ');
                }
                self.entree.push_str(to_insert);
                self.entree.push(' ');
            }
            InsertKind::Digit => self.entree.push_str(to_insert),
            InsertKind::Word => {
                if !self.entree.ends_with(char::is_whitespace) {
                    let last = self.entree.chars().rev().find(|c| !c.is_whitespace());
                    if let Some(c) = last {
                        if c.is_ascii_digit() || c == ')' {
                            self.entree.push(' ');
                        }
                    }
                }
                self.entree.push_str(to_insert);
            }
        }

        self.focus_entree = true;
    }

    /// Évalue via le noyau, puis dépose résultat et démarche dans l'état.
    fn eval_via_noyau(&mut self) {
        let s = self.entree.trim().to_string();
        if s.is_empty() {
            self.set_erreur("Entrée vide");
            return;
        }

        let liaisons = match self.liaisons_lues() {
            Ok(l) => l,
            Err(msg) => {
                self.set_erreur(msg);
                return;
            }
        };

        match crate::noyau::eval_avec_liaisons(&s, self.digits, &liaisons) {
            Ok((resultat, d_noyau)) => {
                let d_ui = Demarche {
                    jetons: d_noyau.jetons,
                    rpn: d_noyau.rpn,
                    contexte: d_noyau.contexte,
                    note: d_noyau.note,
                };
                self.set_resultat(resultat, d_ui);
            }
            Err(e) => self.set_erreur(e.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Action {
    ClearEntree,
    ClearResultats,
    ResetTotal,
    Backspace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InsertKind {
    Digit,
    Word,
    Func,
    Op,
    Comma,
    OpenParen,
    CloseParen,
}
