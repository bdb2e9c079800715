#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::OpenApi;
    use utoipa::openapi::PathItemType;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();

        for name in [
            "ErrorResponse",
            "ValidationIssue",
            "HealthResponse",
            "RoleResponse",
            "UserListResponse",
            "CreateUserInput",
        ] {
            assert!(components.schemas.contains_key(name), "missing schema {name}");
        }

        // Verify that the schema can be serialized to JSON without errors
        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) =
            error_response_schema
        {
            let properties = &obj.properties;
            assert!(properties.contains_key("status"));
            assert!(properties.contains_key("message"));
            assert!(properties.contains_key("error"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_role_schema_exposes_user_count() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) =
            components.schemas.get("RoleDto").unwrap()
        {
            assert!(obj.properties.contains_key("_count"));
            assert!(obj.properties.contains_key("deleted_at"));
        } else {
            panic!("RoleDto should be an object schema");
        }
    }

    #[test]
    fn test_openapi_paths_cover_all_operations() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/v1/auth/login", PathItemType::Post),
            ("/api/v1/students/signup", PathItemType::Post),
            ("/api/v1/roles", PathItemType::Get),
            ("/api/v1/roles", PathItemType::Post),
            ("/api/v1/roles/{role_id}", PathItemType::Get),
            ("/api/v1/roles/{role_id}", PathItemType::Put),
            ("/api/v1/roles/{role_id}", PathItemType::Delete),
            ("/api/v1/roles/{role_id}/restore", PathItemType::Post),
            ("/api/v1/users", PathItemType::Get),
            ("/api/v1/users", PathItemType::Post),
            ("/api/v1/users/{user_id}", PathItemType::Get),
            ("/api/v1/users/{user_id}", PathItemType::Put),
            ("/api/v1/users/{user_id}", PathItemType::Delete),
            ("/api/v1/users/{user_id}/status", PathItemType::Patch),
            ("/api/v1/users/{user_id}/restore", PathItemType::Post),
        ];

        for (path, method) in expected {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {path}"));
            assert!(
                item.operations.contains_key(&method),
                "missing operation on {path}"
            );
        }
    }

    #[test]
    fn test_mutations_document_forbidden_response() {
        let openapi = ApiDoc::openapi();
        let roles = openapi.paths.paths.get("/api/v1/roles").unwrap();
        let create = roles.operations.get(&PathItemType::Post).unwrap();

        assert!(create.responses.responses.contains_key("201"));
        assert!(create.responses.responses.contains_key("403"));
        assert!(create.responses.responses.contains_key("409"));
    }
}
