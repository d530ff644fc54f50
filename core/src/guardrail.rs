//! Collector validation guardrail.
//!
//! The debt-validation statute may only be cited when all three
//! preconditions hold. Absence of any one routes statute selection to the
//! entity's general false-representation / unfair-practice citations —
//! it never fails the evaluation.

use crate::entity::EntityType;

pub fn can_cite_validation_duty(
    entity_type: EntityType,
    has_validation_request: bool,
    collection_continued: bool,
) -> bool {
    entity_type == EntityType::Collector && has_validation_request && collection_continued
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_full_collector_combination_passes() {
        let types = [EntityType::Cra, EntityType::Furnisher, EntityType::Collector];
        for entity_type in types {
            for has_request in [false, true] {
                for continued in [false, true] {
                    let expected = entity_type == EntityType::Collector && has_request && continued;
                    assert_eq!(
                        can_cite_validation_duty(entity_type, has_request, continued),
                        expected,
                        "{entity_type:?} request={has_request} continued={continued}"
                    );
                }
            }
        }
    }
}
