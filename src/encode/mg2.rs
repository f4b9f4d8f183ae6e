//! MG2 body: lossy fixed-point. Vertices quantize to a grid anchored at the
//! bounding-box minimum and are sorted by grid cell so coordinate deltas
//! stay small. Normals are stored as spherical residuals against a smooth
//! predictor that the decoder reproduces from the decoded geometry.

use super::{Config, Err};
use crate::core::bit_coder::{write_string, write_tag, ByteWriter};
use crate::core::mesh::Mesh;
use crate::shared::grid::{
    dequantize_positions, encode_coordinate_deltas, quantize_positions, sort_by_cell, Grid,
};
use crate::shared::normal_coder::{encode_normals, smooth_normals};
use crate::shared::quantize::encode_channel_deltas;
use crate::shared::reorder::{
    apply_permutation, delta_encode_indices, invert_permutation, reorder, rotate_triangles,
    sort_triangles,
};
use crate::shared::transpose::interleave;
use crate::shared::{
    lzma, TAG_ATTRIBS, TAG_GRID_INDICES, TAG_INDICES, TAG_MG2, TAG_NORMALS, TAG_TEX_COORDS,
    TAG_VERTICES,
};

pub(crate) fn encode_body<W: ByteWriter>(
    mesh: &Mesh,
    writer: &mut W,
    cfg: Config,
) -> Result<(), Err> {
    let vertex_count = mesh.vertex_count();

    // Canonical triangle order and first-touch vertex numbering, as in MG1.
    let mut indices = mesh.indices.clone();
    let permutation = reorder(&mut indices, vertex_count);
    let positions = apply_permutation(&mesh.vertices, &permutation);
    let mut normals = mesh
        .normals
        .as_ref()
        .map(|n| apply_permutation(n, &permutation));
    let mut tex_coords: Vec<_> = mesh
        .tex_maps
        .iter()
        .map(|m| apply_permutation(&m.coords, &permutation))
        .collect();
    let mut attrib_values: Vec<_> = mesh
        .attrib_maps
        .iter()
        .map(|m| apply_permutation(&m.values, &permutation))
        .collect();

    // Quantize, then re-sort vertices spatially. The stable sort keeps the
    // first-touch order as the tie-break inside a cell.
    let grid = Grid::build(&positions, cfg.vertex_precision);
    if grid.cell_count() > u32::MAX as u128 {
        return Err(Err::GridOverflow);
    }
    let quantized = quantize_positions(&positions, grid.min, cfg.vertex_precision);
    let cells: Vec<u32> = positions.iter().map(|&p| grid.cell_of(p)).collect();

    let order = sort_by_cell(&cells, &quantized);
    let quantized = apply_permutation(&quantized, &order);
    let cells = apply_permutation(&cells, &order);
    normals = normals.map(|n| apply_permutation(&n, &order));
    for coords in tex_coords.iter_mut() {
        *coords = apply_permutation(coords, &order);
    }
    for values in attrib_values.iter_mut() {
        *values = apply_permutation(values, &order);
    }

    // Rewrite triangles through the spatial permutation and canonicalize
    // again; the vertex numbering is final now, so no further remap.
    let old_to_new = invert_permutation(&order);
    for tri in indices.iter_mut() {
        for corner in tri.iter_mut() {
            *corner = old_to_new[*corner as usize];
        }
    }
    rotate_triangles(&mut indices);
    sort_triangles(&mut indices);

    write_tag(writer, TAG_MG2)?;
    writer.write_u32(vertex_count as u32)?;
    writer.write_u32(mesh.triangle_count() as u32)?;
    writer.write_u32(mesh.tex_maps.len() as u32)?;
    writer.write_u32(mesh.attrib_maps.len() as u32)?;
    writer.write_u32(super::header_flags(mesh))?;
    writer.write_f32(cfg.vertex_precision)?;
    writer.write_f32(cfg.normal_precision)?;
    for axis in 0..3 {
        writer.write_f32(grid.min[axis])?;
    }
    for axis in 0..3 {
        writer.write_f32(grid.max[axis])?;
    }
    for axis in 0..3 {
        writer.write_u32(grid.divisions[axis])?;
    }

    write_tag(writer, TAG_INDICES)?;
    lzma::pack(writer, &delta_encode_indices(&indices))?;

    write_tag(writer, TAG_GRID_INDICES)?;
    let mut cell_bytes = Vec::with_capacity(cells.len() * 4);
    for &cell in &cells {
        cell_bytes.extend_from_slice(&cell.to_le_bytes());
    }
    lzma::pack(writer, &interleave(&cell_bytes, 4))?;

    write_tag(writer, TAG_VERTICES)?;
    let coordinate_deltas = encode_coordinate_deltas(&quantized, &cells);
    lzma::pack(writer, &interleave(&coordinate_deltas, 4))?;

    if let Some(normals) = &normals {
        // The predictor must see what the decoder will see: dequantized
        // positions and the final triangle list.
        let decoded_positions =
            dequantize_positions(&quantized, grid.min, cfg.vertex_precision);
        let predicted = smooth_normals(&decoded_positions, &indices);
        write_tag(writer, TAG_NORMALS)?;
        let residuals = encode_normals(normals, &predicted, cfg.normal_precision);
        lzma::pack(writer, &interleave(&residuals, 4))?;
    }

    for (map, coords) in mesh.tex_maps.iter().zip(&tex_coords) {
        write_tag(writer, TAG_TEX_COORDS)?;
        write_string(writer, &map.name)?;
        write_string(writer, map.file_name.as_deref().unwrap_or(""))?;
        writer.write_f32(map.precision)?;
        let deltas = encode_channel_deltas(coords, map.precision);
        lzma::pack(writer, &interleave(&deltas, 4))?;
    }

    for (map, values) in mesh.attrib_maps.iter().zip(&attrib_values) {
        write_tag(writer, TAG_ATTRIBS)?;
        write_string(writer, &map.name)?;
        writer.write_f32(map.precision)?;
        let deltas = encode_channel_deltas(values, map.precision);
        lzma::pack(writer, &interleave(&deltas, 4))?;
    }
    Ok(())
}
