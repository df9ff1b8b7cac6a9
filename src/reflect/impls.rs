use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Utc};

use super::{Field, Reflect, ScalarKind, Shape};
use crate::convert;
use crate::error::BindError;
use crate::request::FileHeader;

macro_rules! signed_field {
    ($($ty:ty),* $(,)?) => {$(
        impl Field for $ty {
            fn shape() -> Shape {
                Shape::Scalar(ScalarKind::Int)
            }

            fn is_empty_value(&self) -> bool {
                *self == 0
            }

            fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
                *self = convert::parse_int(raw, name)?;
                Ok(())
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($ty:ty),* $(,)?) => {$(
        impl Field for $ty {
            fn shape() -> Shape {
                Shape::Scalar(ScalarKind::Uint)
            }

            fn is_empty_value(&self) -> bool {
                *self == 0
            }

            fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
                *self = convert::parse_uint(raw, name)?;
                Ok(())
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64, isize);
unsigned_field!(u8, u16, u32, u64, usize);

impl Field for f64 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Float)
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }

    fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
        *self = convert::parse_float(raw, name)?;
        Ok(())
    }
}

impl Field for f32 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Float)
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }

    fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
        *self = convert::parse_float(raw, name)? as f32;
        Ok(())
    }
}

impl Field for bool {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Bool)
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }

    fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
        *self = convert::parse_bool(raw, name)?;
        Ok(())
    }
}

impl Field for String {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::String)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn set_param(&mut self, raw: &str, _name: &str) -> Result<(), BindError> {
        raw.clone_into(self);
        Ok(())
    }
}

impl Field for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::DateTime)
    }

    fn is_empty_value(&self) -> bool {
        convert::is_zero_instant(self.timestamp(), self.timestamp_subsec_nanos())
    }

    fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
        *self = convert::parse_time(raw, name)?.with_timezone(&Utc);
        Ok(())
    }
}

impl Field for DateTime<FixedOffset> {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::DateTime)
    }

    fn is_empty_value(&self) -> bool {
        convert::is_zero_instant(self.timestamp(), self.timestamp_subsec_nanos())
    }

    fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
        *self = convert::parse_time(raw, name)?;
        Ok(())
    }
}

impl Field for FileHeader {
    fn shape() -> Shape {
        Shape::File
    }

    fn is_empty_value(&self) -> bool {
        self.filename.is_empty() && self.data.is_empty()
    }

    fn set_files(&mut self, files: Vec<FileHeader>, _name: &str) -> Result<(), BindError> {
        if let Some(file) = files.into_iter().next() {
            *self = file;
        }
        Ok(())
    }
}

impl Field for serde_json::Value {
    fn shape() -> Shape {
        Shape::Any
    }

    fn is_empty_value(&self) -> bool {
        self.is_null()
    }
}

impl<T: Field + Default> Field for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(T::shape)
    }

    fn is_empty_value(&self) -> bool {
        match self {
            Some(value) => value.is_empty_value(),
            None => true,
        }
    }

    fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
        if raw.is_empty() {
            *self = None;
            return Ok(());
        }
        let mut value = T::default();
        value.set_param(raw, name)?;
        *self = Some(value);
        Ok(())
    }

    fn set_params(&mut self, raws: &[&str], name: &str) -> Result<(), BindError> {
        if raws.is_empty() {
            *self = None;
            return Ok(());
        }
        let mut value = T::default();
        value.set_params(raws, name)?;
        *self = Some(value);
        Ok(())
    }

    fn set_files(&mut self, files: Vec<FileHeader>, name: &str) -> Result<(), BindError> {
        if files.is_empty() {
            *self = None;
            return Ok(());
        }
        let mut value = T::default();
        value.set_files(files, name)?;
        *self = Some(value);
        Ok(())
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        self.as_ref()?.as_reflect()
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut()?.as_reflect_mut()
    }

    fn ensure_reflect(&mut self) -> Option<&mut dyn Reflect> {
        self.get_or_insert_with(T::default).ensure_reflect()
    }
}

impl<T: Field> Field for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }

    fn set_param(&mut self, raw: &str, name: &str) -> Result<(), BindError> {
        (**self).set_param(raw, name)
    }

    fn set_params(&mut self, raws: &[&str], name: &str) -> Result<(), BindError> {
        (**self).set_params(raws, name)
    }

    fn set_files(&mut self, files: Vec<FileHeader>, name: &str) -> Result<(), BindError> {
        (**self).set_files(files, name)
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        (**self).as_reflect()
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        (**self).as_reflect_mut()
    }

    fn ensure_reflect(&mut self) -> Option<&mut dyn Reflect> {
        (**self).ensure_reflect()
    }
}

impl<T: Field + Default> Field for Vec<T> {
    fn shape() -> Shape {
        Shape::List(T::shape)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn set_params(&mut self, raws: &[&str], name: &str) -> Result<(), BindError> {
        let mut values = Vec::with_capacity(raws.len());
        for raw in raws {
            let mut value = T::default();
            value.set_param(raw, name)?;
            values.push(value);
        }
        *self = values;
        Ok(())
    }

    fn set_files(&mut self, files: Vec<FileHeader>, name: &str) -> Result<(), BindError> {
        let mut values = Vec::with_capacity(files.len());
        for file in files {
            let mut value = T::default();
            value.set_files(vec![file], name)?;
            values.push(value);
        }
        *self = values;
        Ok(())
    }
}

impl<V: Field, S> Field for HashMap<String, V, S> {
    fn shape() -> Shape {
        Shape::Map(V::shape)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<V: Field> Field for BTreeMap<String, V> {
    fn shape() -> Shape {
        Shape::Map(V::shape)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}
