//! Checklist template generation
//!
//! Every package yields the same seven sections in the same order. Section
//! contents are parameterised by the package: one artwork check per symbol,
//! two checks per named feature, and the payline count, reel layout, bet
//! range, volatility and max win interpolated into titles.
//!
//! Item ids are `<section>-<nn>` (1-based), so the same package always
//! produces the same ids, titles and section keys.

use crate::{CategoryId, Checklist, ChecklistItem, GamePackage};

/// Section definitions in display order: (key, label)
pub const SECTIONS: &[(&str, &str)] = &[
    ("reels", "Reels & Symbols"),
    ("paytable", "Paytable"),
    ("bonus", "Bonus Features"),
    ("betting", "Bet & Balance"),
    ("gameplay", "Gameplay & UI"),
    ("math", "Math & Volatility"),
    ("compliance", "Compliance"),
];

/// Build the initial checklist for a package
///
/// All items start unchecked with no evidence and no severity.
pub fn generate_checklist(package: &GamePackage) -> Checklist {
    let mut checklist = Checklist::new();
    for (key, label) in SECTIONS {
        let drafts = match *key {
            "reels" => reels_section(package),
            "paytable" => paytable_section(package),
            "bonus" => bonus_section(package),
            "betting" => betting_section(package),
            "gameplay" => gameplay_section(),
            "math" => math_section(package),
            _ => compliance_section(package),
        };
        let items = drafts
            .into_iter()
            .enumerate()
            .map(|(i, (title, description))| {
                ChecklistItem::new(format!("{}-{:02}", key, i + 1), *label, title, description)
            })
            .collect();
        checklist.push_section(CategoryId::new(*key), items);
    }
    checklist
}

type Draft = (String, String);

fn draft(title: impl Into<String>, description: impl Into<String>) -> Draft {
    (title.into(), description.into())
}

fn reels_section(package: &GamePackage) -> Vec<Draft> {
    let layout = package.layout;
    let mut items = vec![
        draft(
            format!("Reel grid renders as {}", layout),
            format!(
                "{} reels with {} visible rows ({} positions) render without clipping.",
                layout.reels,
                layout.rows,
                layout.positions()
            ),
        ),
        draft(
            "Reels spin and stop left to right",
            "Each reel starts and stops in order, including after quick stop.",
        ),
        draft(
            format!("Stopped symbols align on all {} rows", layout.rows),
            "No symbol is offset or half visible once the reels settle.",
        ),
        draft(
            "Reel strip weights match the math sheet",
            "Strip contents and weights in the build equal the certified math model.",
        ),
    ];
    items.extend(package.symbols.iter().map(|symbol| {
        draft(
            format!("Symbol '{}' artwork and win animation", symbol.name),
            format!(
                "The {} symbol renders correctly at rest and plays its win animation.",
                symbol.kind
            ),
        )
    }));
    items
}

fn paytable_section(package: &GamePackage) -> Vec<Draft> {
    let payouts = package
        .symbols
        .iter()
        .map(|s| format!("{} ({})", s.name, s.payout_summary()))
        .collect::<Vec<_>>()
        .join("; ");
    vec![
        draft(
            format!("Paytable lists all {} paylines", package.paylines),
            format!(
                "The paytable shows {} numbered payline diagrams.",
                package.paylines
            ),
        ),
        draft(
            format!("Payline patterns match the {} design", package.layout),
            "Winning lines highlight the same positions shown in the paytable.",
        ),
        draft(
            "Symbol payouts match the math sheet",
            format!("Verify displayed payouts: {}.", payouts),
        ),
        draft(
            "Paytable values follow the selected bet",
            format!(
                "Payout amounts rescale when the bet changes across {}.",
                package.bet_range()
            ),
        ),
    ]
}

fn bonus_section(package: &GamePackage) -> Vec<Draft> {
    let mut items: Vec<Draft> = package
        .features
        .iter()
        .flat_map(|feature| {
            [
                draft(
                    format!("{} triggers under the documented conditions", feature),
                    format!("Force and natural triggers of {} start the feature.", feature),
                ),
                draft(
                    format!("{} awards match the math sheet", feature),
                    format!("Wins paid inside {} equal the certified values.", feature),
                ),
            ]
        })
        .collect();
    items.push(draft(
        "Bonus features return cleanly to the base game",
        "Balance, bet and reel state are correct after every feature ends.",
    ));
    items
}

fn betting_section(package: &GamePackage) -> Vec<Draft> {
    vec![
        draft(
            format!("Minimum bet of {:.2} is accepted", package.min_bet),
            "The lowest bet step can be selected and spun.",
        ),
        draft(
            format!("Maximum bet of {:.2} is accepted", package.max_bet),
            "The highest bet step can be selected and spun.",
        ),
        draft(
            format!("Bets outside {} are rejected", package.bet_range()),
            "Bet controls and server both refuse out-of-range values.",
        ),
        draft(
            "Balance is debited once per spin",
            "The total bet leaves the balance exactly once, before the reels stop.",
        ),
        draft(
            "Wins are credited to the balance",
            "The win meter and balance agree after every winning round.",
        ),
        draft(
            "Spin is blocked when balance is insufficient",
            "A clear message is shown and no round is started.",
        ),
    ]
}

fn gameplay_section() -> Vec<Draft> {
    vec![
        draft(
            "Autoplay starts, stops and respects limits",
            "Loss, single-win and spin-count limits stop autoplay.",
        ),
        draft(
            "Quick spin mode works",
            "Quick spin shortens animations without changing outcomes.",
        ),
        draft(
            "Sound and music toggles persist",
            "Audio settings survive a reload.",
        ),
        draft(
            "Info and rules screens are complete",
            "Rules describe every feature and symbol in the build.",
        ),
        draft(
            "Game history records each round",
            "Bet, win and outcome of each round appear in history.",
        ),
        draft(
            "Layout adapts to portrait and landscape",
            "Controls remain reachable on supported screen sizes.",
        ),
        draft(
            "Interrupted round resumes after reconnect",
            "A round in progress is restored with the same outcome.",
        ),
    ]
}

fn math_section(package: &GamePackage) -> Vec<Draft> {
    vec![
        draft(
            format!(
                "{} volatility confirmed by simulation",
                package.volatility.label()
            ),
            "Hit frequency and win distribution match the declared tier.",
        ),
        draft(
            "RTP within certified tolerance",
            "Simulated return matches the certified RTP within tolerance.",
        ),
        draft(
            format!("Max win of {}x is reachable and capped", package.max_win),
            format!(
                "Rounds stop paying at {}x the total bet and end the feature.",
                package.max_win
            ),
        ),
        draft(
            "Win distribution matches the math sheet",
            "Per-symbol hit rates are within the expected range.",
        ),
    ]
}

fn compliance_section(package: &GamePackage) -> Vec<Draft> {
    vec![
        draft(
            "RNG certification reference is attached",
            "Attach the certificate for the build under test as evidence.",
        ),
        draft(
            format!("Max win of {}x is disclosed in the rules", package.max_win),
            "The rules screen states the max win exactly.",
        ),
        draft(
            "Responsible gaming links are present",
            "Session reminders and help links open correctly.",
        ),
        draft(
            "Currency and locale formatting",
            "Amounts use the player's currency symbol and separators.",
        ),
        draft(
            "Game version is shown in the client",
            format!("The {} build number is visible in the info screen.", package.name),
        ),
    ]
}
