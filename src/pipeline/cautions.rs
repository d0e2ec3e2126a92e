//! Per-drug DUR caution entries as shown to the user.

use crate::models::enums::ListKind;
use crate::pipeline::registry::DurRecord;

/// Shown for elderly-caution rows, which carry no prohibition text.
const ELDERLY_NOTICE: &str = "주의필요";

/// Render one DUR row for the drug record. Null fields render as empty text.
pub fn format_caution(kind: ListKind, record: &DurRecord) -> String {
    let ingredient = record.ingredient_name().unwrap_or_default();
    let prohibition = record.prohibition().unwrap_or_default();
    match kind {
        ListKind::Elderly => format!("{ingredient}: {ELDERLY_NOTICE}"),
        ListKind::SplitTablet => prohibition,
        ListKind::EffectDuplication => {
            format!("{ingredient}: {}", record.effect_name().unwrap_or_default())
        }
        ListKind::Pregnancy
        | ListKind::AgeSpecific
        | ListKind::DosageCaution
        | ListKind::DurationCaution
        | ListKind::ConcurrentUse
        | ListKind::ProductInfo => format!("{ingredient}: {prohibition}"),
    }
}

/// Render every row of a list.
pub fn format_cautions(kind: ListKind, records: &[DurRecord]) -> Vec<String> {
    records.iter().map(|r| format_caution(kind, r)).collect()
}
