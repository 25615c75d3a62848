//! 测试用的最小 ONNX 模型
//!
//! 图结构：`input [batch, H, W, 3]` -> ReduceMean(axes=[1, 2]) -> Softmax(axis=1) -> `probs [batch, 3]`。
//! 输出为三个通道均值的 softmax，opset 13。

use std::path::{Path, PathBuf};

const IR_VERSION: i64 = 7;
const OPSET_VERSION: i64 = 13;

const ELEM_FLOAT: i64 = 1;
const ATTR_INT: i64 = 2;
const ATTR_INTS: i64 = 7;

fn varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn int_field(buf: &mut Vec<u8>, field: u64, value: i64) {
    varint(buf, field << 3);
    varint(buf, value as u64);
}

fn bytes_field(buf: &mut Vec<u8>, field: u64, data: &[u8]) {
    varint(buf, (field << 3) | 2);
    varint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

fn str_field(buf: &mut Vec<u8>, field: u64, value: &str) {
    bytes_field(buf, field, value.as_bytes());
}

enum Dim {
    Fixed(i64),
    Symbol(&'static str),
}

fn value_info(name: &str, dims: &[Dim]) -> Vec<u8> {
    let mut shape = Vec::new();
    for dim in dims {
        let mut d = Vec::new();
        match dim {
            Dim::Fixed(value) => int_field(&mut d, 1, *value),
            Dim::Symbol(param) => str_field(&mut d, 2, param),
        }
        bytes_field(&mut shape, 1, &d);
    }

    let mut tensor_type = Vec::new();
    int_field(&mut tensor_type, 1, ELEM_FLOAT);
    bytes_field(&mut tensor_type, 2, &shape);

    let mut type_proto = Vec::new();
    bytes_field(&mut type_proto, 1, &tensor_type);

    let mut info = Vec::new();
    str_field(&mut info, 1, name);
    bytes_field(&mut info, 2, &type_proto);
    info
}

fn int_attr(name: &str, value: i64) -> Vec<u8> {
    let mut attr = Vec::new();
    str_field(&mut attr, 1, name);
    int_field(&mut attr, 3, value);
    int_field(&mut attr, 20, ATTR_INT);
    attr
}

fn ints_attr(name: &str, values: &[i64]) -> Vec<u8> {
    let mut attr = Vec::new();
    str_field(&mut attr, 1, name);
    for &value in values {
        int_field(&mut attr, 8, value);
    }
    int_field(&mut attr, 20, ATTR_INTS);
    attr
}

fn node(op_type: &str, input: &str, output: &str, attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut node = Vec::new();
    str_field(&mut node, 1, input);
    str_field(&mut node, 2, output);
    str_field(&mut node, 3, output);
    str_field(&mut node, 4, op_type);
    for attribute in attributes {
        bytes_field(&mut node, 5, attribute);
    }
    node
}

/// 序列化后的 ModelProto，输入空间尺寸为 `height x width`
pub fn channel_softmax_model(width: i64, height: i64) -> Vec<u8> {
    let mut graph = Vec::new();
    bytes_field(
        &mut graph,
        1,
        &node(
            "ReduceMean",
            "input",
            "channel_mean",
            &[ints_attr("axes", &[1, 2]), int_attr("keepdims", 0)],
        ),
    );
    bytes_field(
        &mut graph,
        1,
        &node("Softmax", "channel_mean", "probs", &[int_attr("axis", 1)]),
    );
    str_field(&mut graph, 2, "channel_softmax");
    bytes_field(
        &mut graph,
        11,
        &value_info(
            "input",
            &[Dim::Symbol("batch"), Dim::Fixed(height), Dim::Fixed(width), Dim::Fixed(3)],
        ),
    );
    bytes_field(
        &mut graph,
        12,
        &value_info("probs", &[Dim::Symbol("batch"), Dim::Fixed(3)]),
    );

    let mut opset = Vec::new();
    int_field(&mut opset, 2, OPSET_VERSION);

    let mut model = Vec::new();
    int_field(&mut model, 1, IR_VERSION);
    str_field(&mut model, 2, "onnx-biomed-tests");
    bytes_field(&mut model, 7, &graph);
    bytes_field(&mut model, 8, &opset);
    model
}

/// 将模型写入 `dir`，返回文件路径
pub fn write_channel_softmax_model(dir: &Path, width: i64, height: i64) -> PathBuf {
    let path = dir.join("channel_softmax.onnx");
    std::fs::write(&path, channel_softmax_model(width, height)).unwrap();
    path
}
