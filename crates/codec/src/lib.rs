#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
#[allow(unused_imports)]
extern crate alloc;

#[macro_use]
extern crate tracing;

mod error;
pub use error::{AddressReason, Error, Result, RlpError, RlpErrorKind, SlicePosition};

pub mod cursor;
pub use cursor::Cursor;

pub mod abi;
pub mod address;
pub mod keccak;
pub mod rlp;
pub mod scalar;
pub mod typed_data;

#[doc(no_inline)]
pub use bytes::{self, BufMut, Bytes, BytesMut};
#[doc(no_inline)]
pub use num_bigint::{self, BigInt};
