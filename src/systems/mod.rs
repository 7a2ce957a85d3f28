pub mod sdk;
pub mod achievements;
pub mod economy;
pub mod offline;
pub mod secondary;
pub mod shop;
pub mod tick;
#[cfg(feature="system-prestige")]   pub mod prestige;
#[cfg(feature="system-flash_sale")] pub mod flash_sale;
#[cfg(feature="system-golden")]     pub mod golden;
