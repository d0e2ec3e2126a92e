//! Markdown report for one identification result.

use crate::models::drug::AttributeValue;
use crate::models::result::RequestResult;

pub const DISCLAIMER: &str = "이 서비스는 식품의약품안전처와 약학정보원이 제공하는 데이터를 기반으로 제작하였습니다. \
참고용으로만 사용하고 반드시 약사 및 의사와 상담 후 복용하시기 바랍니다.";

pub const TABOO_WARNING: &str =
    "이 약은 같은 기간에 함께 드시면 위험할 수 있습니다. 복용에 주의해주세요.";

pub const DRUG_LIST_HEADING: &str = "복용약 목록";

const RULE: &str = "---";

/// Render the result as the report shown to the user.
///
/// Taboo pairs come first, then every drug with its attributes in stored order.
pub fn render_markdown(result: &RequestResult) -> String {
    let mut lines: Vec<String> = vec![DISCLAIMER.to_string()];

    let taboo = result.taboo_names();
    if !taboo.is_empty() {
        lines.push(RULE.to_string());
        lines.push(TABOO_WARNING.to_string());
        for (a, b) in &taboo {
            lines.push(format!("**{a} - {b}**"));
        }
    }

    if !result.records().is_empty() {
        lines.push(RULE.to_string());
        lines.push(DRUG_LIST_HEADING.to_string());
        for record in result.records().values() {
            for (key, value) in record.attributes() {
                lines.push(format!("### {key}"));
                match value {
                    AttributeValue::Text(text) => lines.push(text.clone()),
                    AttributeValue::List(items) => {
                        lines.extend(items.iter().map(|item| format!("- {item}")));
                    }
                }
            }
            lines.push(RULE.to_string());
        }
    }

    lines.join("\n\n")
}
