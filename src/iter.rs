use crate::format::BufferLayout;

/// Rows of a strided buffer. The stride padding is skipped, the last row may have none.
pub struct Rows<'a> {
    pub(crate) data: &'a [u8],
    pub(crate) stride: usize,
    pub(crate) row_bytes: usize,
    pub(crate) left: usize,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(data: &'a [u8], layout: &BufferLayout) -> Self {
        Self {
            data,
            stride: layout.stride,
            row_bytes: layout.row_bytes,
            left: layout.height,
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.left == 0 || self.data.len() < self.row_bytes {
            return None;
        }
        self.left -= 1;
        let row = &self.data[..self.row_bytes];
        self.data = self.data.get(self.stride..).unwrap_or_default();
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.left))
    }
}

pub struct RowsMut<'a> {
    pub(crate) data: &'a mut [u8],
    pub(crate) stride: usize,
    pub(crate) row_bytes: usize,
    pub(crate) left: usize,
}

impl<'a> RowsMut<'a> {
    pub(crate) fn new(data: &'a mut [u8], layout: &BufferLayout) -> Self {
        Self {
            data,
            stride: layout.stride,
            row_bytes: layout.row_bytes,
            left: layout.height,
        }
    }
}

impl<'a> Iterator for RowsMut<'a> {
    type Item = &'a mut [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.left == 0 || self.data.len() < self.row_bytes {
            return None;
        }
        self.left -= 1;
        let data = std::mem::take(&mut self.data);
        if self.left == 0 || data.len() < self.stride {
            return Some(&mut data[..self.row_bytes]);
        }
        let (row, rest) = data.split_at_mut(self.stride);
        self.data = rest;
        Some(&mut row[..self.row_bytes])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ColorType, PixelFormat};

    #[test]
    fn strided() {
        let layout = BufferLayout::new(2, 3, &PixelFormat::new(ColorType::GREY, 8), 4).unwrap();
        let data = [1, 2, 0, 0, 3, 4, 0, 0, 5, 6];
        let rows: Vec<_> = Rows::new(&data, &layout).collect();
        assert_eq!(vec![&[1, 2][..], &[3, 4], &[5, 6]], rows);

        let mut data = [0u8; 10];
        for (i, row) in RowsMut::new(&mut data, &layout).enumerate() {
            row.fill(i as u8 + 1);
        }
        assert_eq!([1, 1, 0, 0, 2, 2, 0, 0, 3, 3], data);
    }

    #[test]
    fn stops_at_height() {
        let layout = BufferLayout::new(1, 2, &PixelFormat::new(ColorType::GREY, 16), 0).unwrap();
        let mut data = [9u8; 8];
        assert_eq!(2, RowsMut::new(&mut data, &layout).count());
        assert_eq!(2, Rows::new(&data, &layout).count());
    }
}
