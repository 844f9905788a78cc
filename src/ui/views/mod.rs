mod auth;
mod auto_update;
mod device_detail;
mod device_form;
mod devices;
mod product_edit;

pub use auth::AuthView;
pub use auto_update::AutoUpdateView;
pub use device_detail::DeviceDetailView;
pub use device_form::DeviceFormView;
pub use devices::DevicesView;
pub use product_edit::ProductEditView;
