//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for API boundaries and use case inputs/outputs.

mod catalog_dto;
mod order_dto;
mod user_dto;

pub use catalog_dto::{
    CategoryDto, CategoryRequestDto, CreateInstrumentDto, InstrumentDto, PriceEntryDto,
    RecordPriceDto, ReplenishStockDto, StockDto, UpdateInstrumentDto,
};
pub use order_dto::{
    ChangeStatusDto, OrderDto, OrderLineDto, OrderLineRequestDto, PlaceOrderDto, StatusEventDto,
};
pub use user_dto::{LoginDto, LoginResultDto, RegisterUserDto, UpdateUserDto, UserDto};
