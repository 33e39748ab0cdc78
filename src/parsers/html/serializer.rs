use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, SerializableHandle};

/// 序列化节点本身（outerHTML）
pub fn outer_html(node: &Handle) -> String {
    serialize_with_scope(node, TraversalScope::IncludeNode)
}

/// 序列化整个文档
pub fn serialize_document(document: &Handle) -> String {
    serialize_with_scope(document, TraversalScope::ChildrenOnly(None))
}

fn serialize_with_scope(node: &Handle, traversal_scope: TraversalScope) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope,
        ..SerializeOpts::default()
    };

    // 写入 Vec<u8> 不会产生 IO 错误
    if let Err(e) = serialize(&mut buf, &serializable, opts) {
        tracing::warn!("序列化DOM失败: {}", e);
    }

    String::from_utf8_lossy(&buf).into_owned()
}
