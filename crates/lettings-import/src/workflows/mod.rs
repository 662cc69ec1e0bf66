pub mod checklist;
pub mod property_list;
