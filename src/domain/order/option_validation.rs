use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::catalog::OptionCategory;
use super::errors::OrderError;
use super::value_objects::{OptionSelection, OrderMenuOption};

/// Check a menu selection against every option category of the menu and
/// return the option snapshots to attach to the line item.
///
/// The first violation found is returned. Categories are checked in catalog
/// order, options are returned in request order.
pub fn validate_selections(
    categories: &[OptionCategory],
    selections: &[OptionSelection],
) -> Result<Vec<OrderMenuOption>, OrderError> {
    let mut selected: HashMap<Uuid, &[Uuid]> = HashMap::with_capacity(selections.len());
    for selection in selections {
        if selected
            .insert(selection.option_category_id, &selection.option_item_ids)
            .is_some()
        {
            return Err(OrderError::DuplicateOptionCategory(selection.option_category_id));
        }
    }

    if selected.len() != categories.len() {
        return Err(OrderError::InvalidOptionCategoryCount {
            expected: categories.len(),
            actual: selected.len(),
        });
    }

    for category in categories {
        let Some(item_ids) = selected.get(&category.id) else {
            return Err(OrderError::MissingOptionCategory(category.id));
        };
        check_category(category, item_ids)?;
    }

    let options = selections
        .iter()
        .flat_map(|selection| {
            let category = categories.iter().find(|c| c.id == selection.option_category_id);
            selection
                .option_item_ids
                .iter()
                .filter_map(move |item_id| category.and_then(|c| c.item(*item_id)))
        })
        .map(OrderMenuOption::from_item)
        .collect();

    Ok(options)
}

fn check_category(category: &OptionCategory, item_ids: &[Uuid]) -> Result<(), OrderError> {
    if category.required && item_ids.is_empty() {
        return Err(OrderError::RequiredOptionNotSelected(category.id));
    }

    if !category.multiple && item_ids.len() > 1 {
        return Err(OrderError::MultipleSelectionNotAllowed(category.id));
    }

    if let Some(max) = category.max_options {
        if item_ids.len() > max as usize {
            return Err(OrderError::ExceedsMaxOptionSelection {
                category: category.id,
                max,
                selected: item_ids.len(),
            });
        }
    }

    let mut seen = HashSet::with_capacity(item_ids.len());
    for item_id in item_ids {
        if category.item(*item_id).is_none() {
            return Err(OrderError::InvalidOptionItem { category: category.id, item: *item_id });
        }
        if !seen.insert(*item_id) {
            return Err(OrderError::DuplicateOptionItem { category: category.id, item: *item_id });
        }
    }

    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
