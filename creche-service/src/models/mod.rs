pub mod child;
pub mod creche;
pub mod invoice;
pub mod ledger;
pub mod payment;
pub mod presence;
pub mod staff;

pub use child::{Child, ChildStatus, NewChild};
pub use creche::Creche;
pub use invoice::{Invoice, InvoiceDraft, InvoiceStatus, InvoiceType};
pub use ledger::{Counter, ReconciliationMarker, SequenceKind};
pub use payment::{
    check_amount, Payment, PaymentCategory, PaymentDraft, PaymentKind, PaymentMethod, PaymentStatus,
    PaymentSubject, Period, MAX_AMOUNT,
};
pub use presence::{Presence, PresenceKind, PresenceStatus};
pub use staff::{NewStaff, Staff, StaffPosition, StaffStatus};
