/// Equipment to carry into the field, in display order.
pub const EQUIPMENT_CHECKLIST: [&str; 9] = [
    "Khurpi/trowel",
    "Sample bags (10+)",
    "Permanent marker",
    "Labels",
    "Bucket for mixing",
    "Tape measure (15cm depth)",
    "Field notebook",
    "Phone (charged)",
    "Water bottle",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub index: usize,
    pub label: &'static str,
    pub checked: bool,
}

pub fn checklist_items<F>(checked: F) -> Vec<ChecklistItem>
where
    F: Fn(usize) -> bool,
{
    EQUIPMENT_CHECKLIST
        .into_iter()
        .enumerate()
        .map(|(index, label)| ChecklistItem {
            index,
            label,
            checked: checked(index),
        })
        .collect()
}
