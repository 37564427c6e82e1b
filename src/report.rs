//! Console report of the two decision rules.
use crate::decision::Method;
use crate::Analysis;

/// "X killed with the Y in the Z" for a suspect/weapon/location triple;
/// any other number of picks is listed comma-separated.
pub fn sentence(picks: &[&str]) -> String {
    match picks {
        [suspect, weapon, location] => {
            format!("{suspect} killed with the {weapon} in the {location}")
        }
        _ => picks.join(", "),
    }
}

/// Two paragraphs, one per method:
///
/// ```text
/// Method: mean peak over electrodes:
/// Plum killed with the Rope in the Study
/// ```
pub fn render(analysis: &Analysis) -> String {
    [Method::MeanPeak, Method::ElectrodeVote]
        .iter()
        .map(|&m| format!("Method: {m}:\n{}\n", sentence(&analysis.verdict(m))))
        .collect::<Vec<_>>()
        .join("\n")
}
