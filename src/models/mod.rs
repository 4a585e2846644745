pub mod amenity;
pub mod attendee;
pub mod capacity;
pub mod event;
pub mod message;
pub mod order;
pub mod organizer;
pub mod promo_code;
pub mod raffle;
pub mod registration_list;
pub mod ticket;

pub use amenity::{Amenity, AmenityClaim, AmenityForm, ClaimRequest};
pub use attendee::{Attendee, AttendeeFilter, AttendeeStatus, AttendeeUpdate};
pub use capacity::{CapacityAssignment, CapacityForm, CapacityUsage, CapacityView};
pub use event::{Event, EventFilter, EventForm, EventStatus, EventSummary, TicketSales};
pub use message::{Audience, Message, MessageForm, MessageStatus};
pub use order::{
    AttendeeDetails, CartItem, NewOrder, Order, OrderDetail, OrderFilter, OrderItem, OrderStatus,
    PaymentMethod, QuoteRequest,
};
pub use organizer::{NewOrganizer, Organizer, RegisteredOrganizer};
pub use promo_code::{DiscountKind, PromoCheck, PromoCode, PromoCodeForm};
pub use raffle::{Raffle, RaffleDetail, RaffleForm, RaffleWinner};
pub use registration_list::{
    CodeCheckIn, ListWindow, RegistrationList, RegistrationListForm, RegistrationListView,
};
pub use ticket::{Availability, Ticket, TicketForm, TicketStage};

/// Lets a TEXT column decode straight into a strum-backed enum via
/// `#[sqlx(try_from = "String")]`.
macro_rules! text_enum {
    ($($name:ident),+ $(,)?) => {
        $(
            impl TryFrom<String> for $name {
                type Error = strum::ParseError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }
        )+
    };
}

text_enum!(
    EventStatus,
    OrderStatus,
    PaymentMethod,
    AttendeeStatus,
    DiscountKind,
    Audience,
    MessageStatus,
);
