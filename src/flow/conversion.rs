use super::definition::FlowDefinition;
use crate::error::FlowConversionError;

/// A trait for custom data models that can be converted into a careflow
/// [`FlowDefinition`].
///
/// This is the extension point for making the engine format-agnostic. A
/// consumer that stores its protocols in a visual-editor export, a database
/// row, or any other shape implements this trait to provide the translation
/// into the canonical model, then validates the result with
/// [`FlowGraph::new`](super::FlowGraph::new).
///
/// # Example
///
/// ```rust,no_run
/// use careflow::flow::{FlowDefinition, FlowNode, FlowEdge, NodeConfig, IntoFlowDefinition};
/// use careflow::error::FlowConversionError;
///
/// struct EditorExport { protocol_id: String, steps: Vec<String> }
///
/// impl IntoFlowDefinition for EditorExport {
///     fn into_flow_definition(self) -> Result<FlowDefinition, FlowConversionError> {
///         let mut nodes = vec![FlowNode { id: "start".into(), config: NodeConfig::Start }];
///         for step in &self.steps {
///             nodes.push(FlowNode {
///                 id: step.clone(),
///                 config: NodeConfig::Question { field: step.clone(), title: step.clone() },
///             });
///         }
///         // ... build edges between consecutive steps ...
///         Ok(FlowDefinition { id: self.protocol_id, name: "Imported".into(), nodes, edges: vec![] })
///     }
/// }
/// ```
pub trait IntoFlowDefinition {
    /// Consumes the object and converts it into the canonical flow model.
    fn into_flow_definition(self) -> Result<FlowDefinition, FlowConversionError>;
}
