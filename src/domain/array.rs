// ============================================================
// Layer 3 — Raw Arrays
// ============================================================
// A RawArray is an n-dimensional numeric buffer with a fixed
// shape. It is the unit of input for the whole crate: every
// dataset column starts life as one of these.
//
// Memory model:
//   RawArray { shape, buffer: Arc<RwLock<Buffer>> }
//
//   Cloning a RawArray clones the Arc, NOT the numbers.
//   Two clones therefore alias the same memory, and a write
//   through one (`set`) is visible through the other.
//   A cast (`cast`) or `deep_copy` always allocates a fresh
//   buffer and breaks the link.
//
// Supported element types: f32, f64, i32, i64.
//
// Reference: Rust Book §15 (Rc<T>, RefCell<T> and interior mutability)
//            parking_lot documentation (RwLock)

use std::{ops::Range, sync::Arc};

use anyhow::{bail, ensure, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// ─── ElementType ──────────────────────────────────────────────────────────────
/// The numeric type stored in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    F32,
    F64,
    I32,
    I64,
}

impl ElementType {
    pub fn is_float(self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64)
    }
}

// ─── Buffer ───────────────────────────────────────────────────────────────────
/// Flat, row-major storage for one array or one sample field.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

// Runs `$body` against the inner Vec whatever its element type is.
macro_rules! with_values {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            Buffer::F32($v) => $body,
            Buffer::F64($v) => $body,
            Buffer::I32($v) => $body,
            Buffer::I64($v) => $body,
        }
    };
}

// Like `with_values!` but re-wraps the result in the same variant.
macro_rules! map_values {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            Buffer::F32($v) => Buffer::F32($body),
            Buffer::F64($v) => Buffer::F64($body),
            Buffer::I32($v) => Buffer::I32($body),
            Buffer::I64($v) => Buffer::I64($body),
        }
    };
}

impl Buffer {
    pub fn element_type(&self) -> ElementType {
        match self {
            Buffer::F32(_) => ElementType::F32,
            Buffer::F64(_) => ElementType::F64,
            Buffer::I32(_) => ElementType::I32,
            Buffer::I64(_) => ElementType::I64,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the elements in `range` into a new buffer of the same type.
    /// Callers check `range` against the array shape first.
    pub(crate) fn slice(&self, range: Range<usize>) -> Buffer {
        map_values!(self, v => v[range].to_vec())
    }

    /// Copy whole rows (each `row_len` long) picked by `rows`, in that order.
    pub(crate) fn gather_rows(&self, rows: &[usize], row_len: usize) -> Buffer {
        map_values!(self, v => rows
            .iter()
            .flat_map(move |&r| v[r * row_len..(r + 1) * row_len].iter().copied())
            .collect())
    }

    /// Numeric cast with `as` semantics (floats truncate towards zero).
    pub fn cast(&self, to: ElementType) -> Buffer {
        match to {
            ElementType::F32 => Buffer::F32(with_values!(self, v => v.iter().map(|&x| x as f32).collect())),
            ElementType::F64 => Buffer::F64(with_values!(self, v => v.iter().map(|&x| x as f64).collect())),
            ElementType::I32 => Buffer::I32(with_values!(self, v => v.iter().map(|&x| x as i32).collect())),
            ElementType::I64 => Buffer::I64(with_values!(self, v => v.iter().map(|&x| x as i64).collect())),
        }
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        with_values!(self, v => v.iter().map(|&x| x as f32).collect())
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_values!(self, v => v.iter().map(|&x| x as f64).collect())
    }

    pub fn to_i64_vec(&self) -> Vec<i64> {
        with_values!(self, v => v.iter().map(|&x| x as i64).collect())
    }
}

// ─── ArrayElement ─────────────────────────────────────────────────────────────
/// Rust scalar types that can live in a `Buffer`.
pub trait ArrayElement: Copy + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn into_buffer(values: Vec<Self>) -> Buffer;
    fn view(buffer: &Buffer) -> Option<&[Self]>;
    fn view_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;
}

macro_rules! impl_array_element {
    ($t:ty, $variant:ident) => {
        impl ArrayElement for $t {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            fn into_buffer(values: Vec<Self>) -> Buffer {
                Buffer::$variant(values)
            }

            fn view(buffer: &Buffer) -> Option<&[Self]> {
                match buffer {
                    Buffer::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn view_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
                match buffer {
                    Buffer::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_array_element!(f32, F32);
impl_array_element!(f64, F64);
impl_array_element!(i32, I32);
impl_array_element!(i64, I64);

// ─── RawArray ─────────────────────────────────────────────────────────────────
/// A shape plus a shared, lockable buffer.
///
/// `Clone` is shallow: clones alias the same numbers. Use
/// [`RawArray::deep_copy`] for an independent copy.
#[derive(Debug, Clone)]
pub struct RawArray {
    shape:  Arc<[usize]>,
    buffer: Arc<RwLock<Buffer>>,
}

impl RawArray {
    /// Build an array from row-major `values` with the given shape.
    ///
    /// The shape must have at least one dimension (the sample axis)
    /// and its product must equal `values.len()`.
    pub fn new<E: ArrayElement>(values: Vec<E>, shape: impl Into<Vec<usize>>) -> Result<Self> {
        Self::from_buffer(E::into_buffer(values), shape)
    }

    pub fn from_buffer(buffer: Buffer, shape: impl Into<Vec<usize>>) -> Result<Self> {
        let shape: Vec<usize> = shape.into();
        ensure!(!shape.is_empty(), "array shape must have at least one dimension");

        let expected: usize = shape.iter().product();
        ensure!(
            expected == buffer.len(),
            "shape {:?} needs {} elements but the buffer holds {}",
            shape, expected, buffer.len()
        );

        Ok(Self {
            shape:  shape.into(),
            buffer: Arc::new(RwLock::new(buffer)),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Size of the leading (sample) dimension.
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of elements in one sample, i.e. the product of the trailing dims.
    pub fn row_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    pub fn element_type(&self) -> ElementType {
        self.buffer.read().element_type()
    }

    /// True when both handles point at the same memory.
    pub fn shares_memory(&self, other: &RawArray) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Read one element by its n-dimensional index.
    /// Returns `None` when the index is out of bounds or `E` is the wrong type.
    pub fn get<E: ArrayElement>(&self, index: &[usize]) -> Option<E> {
        let flat = self.flat_index(index)?;
        let guard = self.buffer.read();
        E::view(&guard).map(|v| v[flat])
    }

    /// Write one element. The write is visible through every alias.
    pub fn set<E: ArrayElement>(&self, index: &[usize], value: E) -> Result<()> {
        let Some(flat) = self.flat_index(index) else {
            bail!("index {:?} is out of bounds for shape {:?}", index, self.shape());
        };
        let mut guard = self.buffer.write();
        let current   = guard.element_type();
        match E::view_mut(&mut guard) {
            Some(values) => {
                values[flat] = value;
                Ok(())
            }
            None => bail!(
                "cannot write {:?} into an array of {:?}",
                E::ELEMENT_TYPE, current
            ),
        }
    }

    /// Copy of sample `row` (all trailing dimensions flattened).
    pub fn row(&self, row: usize) -> Option<Buffer> {
        if row >= self.rows() {
            return None;
        }
        let row_len = self.row_len();
        Some(self.buffer.read().slice(row * row_len..(row + 1) * row_len))
    }

    /// Copy the whole buffer out as a Vec of `E`.
    pub fn to_vec<E: ArrayElement>(&self) -> Option<Vec<E>> {
        E::view(&self.buffer.read()).map(|v| v.to_vec())
    }

    /// A snapshot of the buffer, in its own element type.
    pub fn to_buffer(&self) -> Buffer {
        self.buffer.read().clone()
    }

    /// New array with rows picked by `rows`; never aliases `self`.
    pub fn select_rows(&self, rows: &[usize]) -> Result<RawArray> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.rows()) {
            bail!("row {} is out of bounds for {} rows", bad, self.rows());
        }
        let buffer = self.buffer.read().gather_rows(rows, self.row_len());
        let mut shape = self.shape.to_vec();
        shape[0] = rows.len();
        Self::from_buffer(buffer, shape)
    }

    /// New array of element type `to`; never aliases `self`.
    pub fn cast(&self, to: ElementType) -> RawArray {
        Self {
            shape:  self.shape.clone(),
            buffer: Arc::new(RwLock::new(self.buffer.read().cast(to))),
        }
    }

    pub fn deep_copy(&self) -> RawArray {
        Self {
            shape:  self.shape.clone(),
            buffer: Arc::new(RwLock::new(self.buffer.read().clone())),
        }
    }

    fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0usize;
        for (&i, &dim) in index.iter().zip(self.shape.iter()) {
            if i >= dim {
                return None;
            }
            flat = flat * dim + i;
        }
        Some(flat)
    }
}
