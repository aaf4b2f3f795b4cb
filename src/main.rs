// src/main.rs
//
// Calculatrice d'expressions — point d'entrée natif (feature `gui`).
// Le noyau ne journalise que via `log` ; le binaire n'installe aucun logger.

use eframe::egui;

use calculatrice_expr::app::AppCalc;

const TITRE_APP: &str = "Calculatrice d'expressions";

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITRE_APP)
            .with_inner_size([560.0, 740.0])
            .with_min_inner_size([420.0, 620.0]),
        ..Default::default()
    };

    eframe::run_native(
        TITRE_APP,
        options,
        Box::new(|_cc| Ok(Box::<AppCalc>::default())),
    )
}
