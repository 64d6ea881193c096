//! Argument type descriptors.

/// Shape of an argument as far as the calling convention cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// Integers, pointers, enums, booleans and characters.
    Integer,
    Float,
    /// Complex float: two floats of half the size.
    Complex,
    Struct(Vec<Field>),
    /// Unions, arrays and anything else passed by the integer rules.
    Other,
}

/// Member of a struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Byte offset within the enclosing struct.
    pub offset: u32,
    pub ty: ArgType,
    /// Bitfields are ignored when flattening.
    pub bitfield: bool,
}

impl Field {
    #[must_use]
    pub const fn new(offset: u32, ty: ArgType) -> Self {
        Self {
            offset,
            ty,
            bitfield: false,
        }
    }

    #[must_use]
    pub const fn bitfield(offset: u32, ty: ArgType) -> Self {
        Self {
            offset,
            ty,
            bitfield: true,
        }
    }
}

/// Size, alignment and kind of one argument or return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgType {
    pub size: u32,
    pub align: u32,
    pub kind: TypeKind,
}

const fn align_up(value: u32, align: u32) -> u32 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

impl ArgType {
    /// Naturally aligned integer of `size` bytes.
    #[must_use]
    pub const fn int(size: u32) -> Self {
        Self {
            size,
            align: size,
            kind: TypeKind::Integer,
        }
    }

    #[must_use]
    pub const fn float(size: u32) -> Self {
        Self {
            size,
            align: size,
            kind: TypeKind::Float,
        }
    }

    /// Complex float of `size` bytes in total.
    #[must_use]
    pub const fn complex(size: u32) -> Self {
        Self {
            size,
            align: size / 2,
            kind: TypeKind::Complex,
        }
    }

    #[must_use]
    pub const fn other(size: u32, align: u32) -> Self {
        Self {
            size,
            align,
            kind: TypeKind::Other,
        }
    }

    /// Struct with explicitly placed fields. Size and alignment are
    /// derived from the fields.
    #[must_use]
    pub fn structure(fields: Vec<Field>) -> Self {
        let align = fields.iter().map(|f| f.ty.align).max().unwrap_or(1).max(1);
        let end = fields
            .iter()
            .map(|f| f.offset + f.ty.size)
            .max()
            .unwrap_or(0);
        Self {
            size: align_up(end, align),
            align,
            kind: TypeKind::Struct(fields),
        }
    }

    /// Struct laid out in declaration order with C padding rules.
    #[must_use]
    pub fn c_struct(members: impl IntoIterator<Item = Self>) -> Self {
        let mut offset = 0;
        let fields = members
            .into_iter()
            .map(|ty| {
                let field_offset = align_up(offset, ty.align);
                offset = field_offset + ty.size;
                Field::new(field_offset, ty)
            })
            .collect();
        Self::structure(fields)
    }

    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(self.kind, TypeKind::Integer)
    }

    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self.kind, TypeKind::Float)
    }
}

/// Scalar leaf of a flattened struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Leaf<'a> {
    /// Byte offset from the start of the outermost struct.
    pub offset: u32,
    pub ty: &'a ArgType,
}

/// First two scalar leaves of a struct and how many were seen.
///
/// Counting stops once more than two leaves are found, so `count` is only
/// exact up to 2.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Flattened<'a> {
    pub count: usize,
    pub leaves: [Option<Leaf<'a>>; 2],
}

impl<'a> Flattened<'a> {
    pub(crate) fn of(fields: &'a [Field]) -> Self {
        let mut flat = Self::default();
        flat.visit(fields, 0);
        flat
    }

    fn visit(&mut self, fields: &'a [Field], base: u32) {
        for field in fields.iter().filter(|f| !f.bitfield) {
            let offset = base + field.offset;
            match &field.ty.kind {
                TypeKind::Struct(inner) => self.visit(inner, offset),
                _ => {
                    if let Some(slot) = self.leaves.get_mut(self.count) {
                        *slot = Some(Leaf {
                            offset,
                            ty: &field.ty,
                        });
                    }
                    self.count += 1;
                }
            }
            if self.count > 2 {
                return;
            }
        }
    }

    /// The leaves when there are exactly two.
    pub(crate) const fn pair(&self) -> Option<(Leaf<'a>, Leaf<'a>)> {
        match (self.count, self.leaves) {
            (2, [Some(a), Some(b)]) => Some((a, b)),
            _ => None,
        }
    }

    /// The leaf when there is exactly one.
    pub(crate) const fn single(&self) -> Option<Leaf<'a>> {
        match (self.count, self.leaves[0]) {
            (1, Some(a)) => Some(a),
            _ => None,
        }
    }
}
