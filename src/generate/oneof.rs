use super::{message::MessageInfo, FileGenerator};
use crate::error::Error;

impl<'a> FileGenerator<'a> {
    /// Writes the storage and accessors shared by the members of a oneof.
    ///
    /// All members are stored in one slot, next to the number of the member that is set.
    pub(super) fn write_oneof(&mut self, info: &MessageInfo<'a>, index: usize) -> Result<(), Error> {
        let names = &info.oneofs[index];
        let full_name = format!("{}.{}", info.full_name, info.descriptor.oneof_decl[index].name());
        let members: Vec<_> = info
            .members
            .iter()
            .filter(|member| member.oneof.as_ref().map(|oneof| oneof.index) == Some(index))
            .collect();

        self.w.comment(&format!("ONEOF START: {}", full_name))?;
        self.w.variable(&names.storage, "", "null")?;
        self.w.variable(&names.case_storage, "int?", "null")?;
        self.w.new_line();

        self.w.start_function_decl(&names.clear)?;
        self.w.end_function_decl("none")?;
        for slot in [&names.storage, &names.case_storage] {
            self.w.start_assignment(slot)?;
            self.w.argument("null")?;
            self.w.end_assignment()?;
        }
        self.w.end_function()?;

        for member in &members {
            if let Some(oneof) = &member.oneof {
                self.w
                    .static_constant(&oneof.constant, "int", &member.number())?;
            }
        }
        self.w.new_line();

        self.w.start_function_decl(&names.case_getter)?;
        self.w.end_function_decl("int?")?;
        self.w.start_return()?;
        self.w.argument(&names.case_storage)?;
        self.w.end_return()?;
        self.w.end_function()?;

        for member in &members {
            let ty = self.annotation(&member.ty, false)?;

            self.w.start_function_decl(&member.name)?;
            self.w.end_function_decl(&ty)?;
            self.w.start_return()?;
            self.w.argument(&names.storage)?;
            self.w.end_return()?;
            self.w.end_function()?;

            self.w.start_function_decl(&format!("{}=", member.name))?;
            self.w.parameter("value", &ty)?;
            self.w.end_function_decl("none")?;
            self.w.start_assignment(&names.storage)?;
            self.w.argument("value")?;
            self.w.end_assignment()?;
            if let Some(oneof) = &member.oneof {
                self.w.start_assignment(&names.case_storage)?;
                self.w.argument(&oneof.constant)?;
                self.w.end_assignment()?;
            }
            self.w.end_function()?;
        }

        self.w.comment(&format!("ONEOF END: {}", full_name))?;
        self.w.new_line();
        Ok(())
    }
}
