mod document;
mod parcel;
mod result;

pub use document::Document;
pub use parcel::{
  NewParcel, Parcel, ParcelError, ParcelQuery, CREATED_AT_FIELD, CREATED_BY_FIELD, ID_FIELD,
};
pub use result::{DeleteResponse, DeleteResult, InsertOneResult};
